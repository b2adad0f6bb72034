//! Common types used throughout the ETL job
//!
//! Shared enums that appear both in configuration files and in the
//! command-line interface.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

// ============================================================================
// Engine Selection
// ============================================================================

/// Execution backend used to evaluate transformation graphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// In-process Arrow executor
    #[default]
    Memory,
    /// DuckDB SQL executor
    Duckdb,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Memory => write!(f, "memory"),
            EngineKind::Duckdb => write!(f, "duckdb"),
        }
    }
}

impl FromStr for EngineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "arrow" => Ok(EngineKind::Memory),
            "duckdb" => Ok(EngineKind::Duckdb),
            other => Err(Error::invalid_value(
                "engine",
                format!("unknown engine '{other}' (expected memory or duckdb)"),
            )),
        }
    }
}

// ============================================================================
// Timestamp Derivation
// ============================================================================

/// How the event timestamp is derived from the epoch-millisecond `ts` field
///
/// Both modes produce the same value; `FormatRoundtrip` goes through the
/// `YYYY-MM-DD HH:MM:SS` text form and parses it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampMode {
    /// Format as text, then reparse
    #[default]
    FormatRoundtrip,
    /// Truncate to whole seconds directly
    Truncate,
}

impl FromStr for TimestampMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "format_roundtrip" | "roundtrip" => Ok(TimestampMode::FormatRoundtrip),
            "truncate" => Ok(TimestampMode::Truncate),
            other => Err(Error::invalid_value(
                "timestamp_mode",
                format!("unknown mode '{other}' (expected format_roundtrip or truncate)"),
            )),
        }
    }
}

// ============================================================================
// Parquet Compression
// ============================================================================

/// Parquet compression codec for output files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    #[default]
    Snappy,
    Zstd,
    Gzip,
    Uncompressed,
}

impl Compression {
    /// DuckDB `COMPRESSION` option value
    pub fn as_sql(&self) -> &'static str {
        match self {
            Compression::Snappy => "SNAPPY",
            Compression::Zstd => "ZSTD",
            Compression::Gzip => "GZIP",
            Compression::Uncompressed => "UNCOMPRESSED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_kind_parse() {
        assert_eq!("memory".parse::<EngineKind>().unwrap(), EngineKind::Memory);
        assert_eq!("DuckDB".parse::<EngineKind>().unwrap(), EngineKind::Duckdb);
        assert!("spark".parse::<EngineKind>().is_err());
    }

    #[test]
    fn test_engine_kind_serde() {
        let kind: EngineKind = serde_yaml::from_str("duckdb").unwrap();
        assert_eq!(kind, EngineKind::Duckdb);
        assert_eq!(kind.to_string(), "duckdb");
    }

    #[test]
    fn test_timestamp_mode_parse() {
        assert_eq!(
            "truncate".parse::<TimestampMode>().unwrap(),
            TimestampMode::Truncate
        );
        assert_eq!(TimestampMode::default(), TimestampMode::FormatRoundtrip);
    }
}
