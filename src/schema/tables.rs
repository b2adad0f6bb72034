//! Output table definitions

use serde::Serialize;
use std::fmt;

use super::output;

/// One of the five tables produced by a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputTable {
    Songs,
    Artists,
    Users,
    Time,
    Songplays,
}

impl OutputTable {
    /// All tables in write order
    pub const ALL: [OutputTable; 5] = [
        OutputTable::Songs,
        OutputTable::Artists,
        OutputTable::Users,
        OutputTable::Time,
        OutputTable::Songplays,
    ];

    /// Table name, also the path suffix under the output base
    pub fn name(&self) -> &'static str {
        match self {
            OutputTable::Songs => "songs",
            OutputTable::Artists => "artists",
            OutputTable::Users => "users",
            OutputTable::Time => "time",
            OutputTable::Songplays => "songplays",
        }
    }

    /// Hive partition columns, outermost first
    pub fn partition_by(&self) -> &'static [&'static str] {
        match self {
            OutputTable::Songs => &[output::YEAR, output::ARTIST_ID],
            OutputTable::Artists | OutputTable::Users => &[],
            OutputTable::Time | OutputTable::Songplays => &[output::YEAR, output::MONTH],
        }
    }

    /// Columns of the table, in output order
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            OutputTable::Songs => &["song_id", "title", "artist_id", "year", "duration"],
            OutputTable::Artists => &["artist_id", "name", "location", "latitude", "longitude"],
            OutputTable::Users => &["user_id", "first_name", "last_name", "gender", "level"],
            OutputTable::Time => &["timestamp", "hour", "day", "month", "year", "weekday"],
            OutputTable::Songplays => &[
                "songplay_id",
                "start_time",
                "user_id",
                "level",
                "song_id",
                "artist_id",
                "session_id",
                "location",
                "user_agent",
                "month",
                "year",
            ],
        }
    }
}

impl fmt::Display for OutputTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
