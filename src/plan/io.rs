//! Plan inputs and outputs

use crate::storage::Location;
use arrow::datatypes::SchemaRef;
use std::fmt;

/// JSON files under a location selected by a glob
#[derive(Debug, Clone)]
pub struct Source {
    /// Base location the pattern is relative to
    pub location: Location,
    /// Glob pattern (`song_data/*/*/*/*.json`)
    pub pattern: String,
    /// Schema records are decoded into
    pub schema: SchemaRef,
}

impl Source {
    /// Create a JSON source
    pub fn json(location: Location, pattern: impl Into<String>, schema: SchemaRef) -> Self {
        Self {
            location,
            pattern: pattern.into(),
            schema,
        }
    }

    /// Full URL of the glob
    pub fn url(&self) -> String {
        self.location.url_of(&self.pattern)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "json {}", self.url())
    }
}

/// Destination of a table write
///
/// Writes always replace whatever the location held before.
#[derive(Debug, Clone)]
pub struct Sink {
    /// Table directory
    pub location: Location,
    /// Hive partition columns, outermost first
    pub partition_by: Vec<String>,
}

impl Sink {
    /// Create an unpartitioned sink
    pub fn new(location: Location) -> Self {
        Self {
            location,
            partition_by: Vec::new(),
        }
    }

    /// Partition the output by the given columns
    #[must_use]
    pub fn partition_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partition_by = columns.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parquet {}", self.location.url())?;
        if !self.partition_by.is_empty() {
            write!(f, " partitioned by ({})", self.partition_by.join(", "))?;
        }
        Ok(())
    }
}
