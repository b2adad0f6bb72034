//! CLI commands and argument parsing

use crate::config::ConfigOverrides;
use crate::types::{EngineKind, TimestampMode};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Songplay star-schema ETL job
#[derive(Parser, Debug)]
#[command(name = "songplay-etl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML, or JSON with a .json extension)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Input base location (local path or cloud URL)
    /// Supports: /path, s3://bucket/path, s3a://bucket/path, r2://bucket/path, gs://bucket/path, az://container/path
    #[arg(short, long, global = true)]
    pub input: Option<String>,

    /// Output base location (local path or cloud URL)
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// Execution engine (memory, duckdb)
    #[arg(short, long, global = true)]
    pub engine: Option<EngineKind>,

    /// Event time derivation (format_roundtrip, truncate)
    #[arg(long, global = true)]
    pub timestamp_mode: Option<TimestampMode>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to execute; runs the full job when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Command-line values that override the configuration
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            input_base: self.input.clone(),
            output_base: self.output.clone(),
            engine: self.engine,
            timestamp_mode: self.timestamp_mode,
        }
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Build and write all five tables
    Run,

    /// Print the transformation graph of each table
    Plan,

    /// Check the configuration
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
