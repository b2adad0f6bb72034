//! Output module
//!
//! Handles Parquet encoding and Hive-style partition layout.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Encoding Arrow RecordBatches as Parquet (in memory or to any writer)
//! - Splitting a table into `column=value` partition directories

mod partition;
mod writer;

pub use partition::{partition_batch, PartitionedBatch, DEFAULT_PARTITION, PART_FILE};
pub use writer::{encode_batch, ParquetWriter, ParquetWriterConfig};
