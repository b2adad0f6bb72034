//! Record and table schemas
//!
//! Fixed Arrow schemas for the two raw inputs and the names, columns and
//! partitioning of the five output tables.
//!
//! # Inputs
//!
//! - **Catalog records**: one JSON object per track (`song_data`)
//! - **Activity records**: one JSON object per user event (`log_data`)
//!
//! # Outputs
//!
//! | Table       | Partitioned by      |
//! |-------------|---------------------|
//! | `songs`     | `year`, `artist_id` |
//! | `artists`   | -                   |
//! | `users`     | -                   |
//! | `time`      | `year`, `month`     |
//! | `songplays` | `year`, `month`     |

mod tables;
mod types;

pub use tables::OutputTable;
pub use types::{activity, activity_schema, catalog, catalog_schema, output};
