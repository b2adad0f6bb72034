//! Engine result types

use serde::Serialize;

/// Outcome of writing one table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    /// Table directory URL
    pub location: String,
    /// Rows written across all files
    pub rows: usize,
    /// Data files written
    pub files: usize,
    /// Distinct partition directories (0 for unpartitioned tables)
    pub partitions: usize,
}

impl WriteSummary {
    /// Create a summary for a location
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Self::default()
        }
    }

    /// Record one written file
    pub fn add_file(&mut self, rows: usize) {
        self.files += 1;
        self.rows += rows;
    }
}

/// Marker object written after a table's data files
pub const SUCCESS_MARKER: &str = "_SUCCESS";
