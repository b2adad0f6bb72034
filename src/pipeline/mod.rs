//! The star-schema job
//!
//! Three stages, each a pure function from frames to frames:
//!
//! - catalog: songs and artists dimensions from song metadata
//! - activity: users and time dimensions from song-play events
//! - songplays: the fact table, joining plays back to a fresh read of the
//!   song metadata
//!
//! [`Pipeline`] wires the stages to their inputs and writes the five tables.

mod activity;
mod catalog;
mod songplays;

pub use activity::{
    event_time, song_plays_only, time_table, users_table, with_event_time, EVENT_TIME,
    EVENT_TIME_FORMAT,
};
pub use catalog::{artists_table, songs_table};
pub use songplays::songplays_table;

use crate::config::PipelineConfig;
use crate::engine::{Session, WriteSummary};
use crate::error::{Result, ResultExt};
use crate::plan::{Frame, Sink};
use crate::schema::{activity_schema, catalog_schema, OutputTable};
use crate::storage::Location;
use serde::Serialize;
use std::time::Instant;

/// Outcome of writing one table
#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub table: OutputTable,
    #[serde(flatten)]
    pub write: WriteSummary,
    pub elapsed_ms: u64,
}

/// Outcome of a full run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub engine: String,
    pub tables: Vec<TableSummary>,
    pub elapsed_ms: u64,
}

impl RunSummary {
    /// Summary of one table, if it was written
    pub fn table(&self, table: OutputTable) -> Option<&TableSummary> {
        self.tables.iter().find(|t| t.table == table)
    }
}

/// The configured job
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    input: Location,
    output: Location,
}

impl Pipeline {
    /// Build a pipeline from a validated configuration
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let input = Location::parse(&config.input_base)
            .with_context(|| format!("input base {}", config.input_base))?;
        let output = Location::create(&config.output_base)
            .with_context(|| format!("output base {}", config.output_base))?;
        Ok(Self::with_locations(config, input, output))
    }

    /// Build a pipeline over already-resolved locations
    pub fn with_locations(config: PipelineConfig, input: Location, output: Location) -> Self {
        Self {
            config,
            input,
            output,
        }
    }

    /// Effective configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn catalog(&self, session: &Session) -> Frame {
        session.read_json(&self.input, &self.config.song_data, catalog_schema())
    }

    fn activity(&self, session: &Session) -> Frame {
        session.read_json(&self.input, &self.config.log_data, activity_schema())
    }

    /// Transformation graph of every table, in write order
    pub fn graphs(&self, session: &Session) -> Vec<(OutputTable, Frame)> {
        let catalog = self.catalog(session);
        let plays = with_event_time(
            &song_plays_only(&self.activity(session)),
            self.config.timestamp_mode,
        );

        OutputTable::ALL
            .iter()
            .map(|&table| {
                let frame = match table {
                    OutputTable::Songs => songs_table(&catalog),
                    OutputTable::Artists => artists_table(&catalog),
                    OutputTable::Users => users_table(&plays),
                    OutputTable::Time => time_table(&plays),
                    // The fact table reads the song metadata again
                    OutputTable::Songplays => songplays_table(&plays, &self.catalog(session)),
                };
                (table, frame)
            })
            .collect()
    }

    /// Sink of a table under the output base
    pub fn sink(&self, table: OutputTable) -> Sink {
        Sink::new(self.output.child(table.name()))
            .partition_by(table.partition_by().iter().copied())
    }

    /// Write all five tables, replacing previous output
    ///
    /// Tables are written one after another; a failure stops the run and
    /// leaves tables already written in place.
    pub async fn run(&self, session: &Session) -> Result<RunSummary> {
        let started = Instant::now();
        tracing::info!(
            engine = session.engine_name(),
            input = %self.input.url(),
            output = %self.output.url(),
            "Starting run"
        );

        let mut tables = Vec::with_capacity(OutputTable::ALL.len());
        for (table, frame) in self.graphs(session) {
            let table_started = Instant::now();
            tracing::debug!(table = %table, "Plan:\n{}", frame.explain());

            let write = match session.write(&frame, &self.sink(table)).await {
                Ok(write) => write,
                Err(e) => {
                    tracing::error!(table = %table, error = %e, "Failed to write table");
                    return Err(e);
                }
            };

            tracing::info!(
                table = %table,
                rows = write.rows,
                files = write.files,
                location = %write.location,
                "Wrote table"
            );
            tables.push(TableSummary {
                table,
                write,
                elapsed_ms: elapsed_ms(table_started),
            });
        }

        let summary = RunSummary {
            engine: session.engine_name().to_string(),
            tables,
            elapsed_ms: elapsed_ms(started),
        };
        tracing::info!(elapsed_ms = summary.elapsed_ms, "Run complete");
        Ok(summary)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests;
