//! Pipeline configuration
//!
//! The job recognizes two required parameters, the input base location and
//! the output base location. Everything else has a default that matches the
//! published dataset layout. Values are layered: defaults, then an optional
//! YAML file, then environment variables, then command-line flags.

use crate::error::{Error, Result};
use crate::types::{Compression, EngineKind, TimestampMode};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable for the input base location
pub const ENV_INPUT_BASE: &str = "ETL_INPUT_BASE";
/// Environment variable for the output base location
pub const ENV_OUTPUT_BASE: &str = "ETL_OUTPUT_BASE";
/// Environment variable for the execution engine
pub const ENV_ENGINE: &str = "ETL_ENGINE";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Base location of the raw inputs (e.g. `s3a://udacity-dend/`)
    #[serde(default)]
    pub input_base: String,

    /// Base location the five output tables are written under
    #[serde(default)]
    pub output_base: String,

    /// Glob for catalog (song) files, relative to `input_base`
    #[serde(default = "default_song_data")]
    pub song_data: String,

    /// Glob for activity (log) files, relative to `input_base`
    #[serde(default = "default_log_data")]
    pub log_data: String,

    /// Execution backend
    #[serde(default)]
    pub engine: EngineKind,

    /// Event timestamp derivation
    #[serde(default)]
    pub timestamp_mode: TimestampMode,

    /// Parquet output settings
    #[serde(default)]
    pub parquet: ParquetConfig,
}

fn default_song_data() -> String {
    "song_data/*/*/*/*.json".to_string()
}

fn default_log_data() -> String {
    "log-data/*/*/*.json".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_base: String::new(),
            output_base: String::new(),
            song_data: default_song_data(),
            log_data: default_log_data(),
            engine: EngineKind::default(),
            timestamp_mode: TimestampMode::default(),
            parquet: ParquetConfig::default(),
        }
    }
}

/// Parquet output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParquetConfig {
    /// Compression codec
    #[serde(default)]
    pub compression: Compression,

    /// Maximum rows per row group
    #[serde(default = "default_row_group_size")]
    pub row_group_size: usize,
}

fn default_row_group_size() -> usize {
    1024 * 1024
}

impl Default for ParquetConfig {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            row_group_size: default_row_group_size(),
        }
    }
}

/// Values supplied on the command line, all optional
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub input_base: Option<String>,
    pub output_base: Option<String>,
    pub engine: Option<EngineKind>,
    pub timestamp_mode: Option<TimestampMode>,
}

impl PipelineConfig {
    /// Create a config with the two required locations and defaults elsewhere
    pub fn new(input_base: impl Into<String>, output_base: impl Into<String>) -> Self {
        Self {
            input_base: input_base.into(),
            output_base: output_base.into(),
            ..Self::default()
        }
    }

    /// Parse a config from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a config from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config file; `.json` files are read as JSON, anything else as YAML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Resolve the effective configuration
    ///
    /// Starts from the config file when given (defaults otherwise), applies
    /// environment variables, then command-line overrides.
    pub fn resolve(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_overrides(overrides);
        Ok(config)
    }

    /// Apply environment variables through a lookup function
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_INPUT_BASE).filter(|v| !v.is_empty()) {
            self.input_base = value;
        }
        if let Some(value) = lookup(ENV_OUTPUT_BASE).filter(|v| !v.is_empty()) {
            self.output_base = value;
        }
        if let Some(value) = lookup(ENV_ENGINE).filter(|v| !v.is_empty()) {
            self.engine = value.parse()?;
        }
        Ok(())
    }

    /// Apply command-line overrides
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(input) = &overrides.input_base {
            self.input_base.clone_from(input);
        }
        if let Some(output) = &overrides.output_base {
            self.output_base.clone_from(output);
        }
        if let Some(engine) = overrides.engine {
            self.engine = engine;
        }
        if let Some(mode) = overrides.timestamp_mode {
            self.timestamp_mode = mode;
        }
    }

    /// Check that the configuration can drive a run
    pub fn validate(&self) -> Result<()> {
        if self.input_base.trim().is_empty() {
            return Err(Error::missing_field("input_base"));
        }
        if self.output_base.trim().is_empty() {
            return Err(Error::missing_field("output_base"));
        }
        if self.song_data.trim().is_empty() {
            return Err(Error::invalid_value("song_data", "glob must not be empty"));
        }
        if self.log_data.trim().is_empty() {
            return Err(Error::invalid_value("log_data", "glob must not be empty"));
        }
        if self.parquet.row_group_size == 0 {
            return Err(Error::invalid_value(
                "parquet.row_group_size",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}
