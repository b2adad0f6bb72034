//! CLI module
//!
//! Command-line interface for running the job.
//!
//! # Commands
//!
//! - `run` - Build and write all five tables (the default)
//! - `plan` - Print each table's transformation graph
//! - `validate` - Check the configuration

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
