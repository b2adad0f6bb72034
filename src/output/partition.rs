//! Hive-style partition splitting
//!
//! Splits a batch into one batch per distinct combination of partition
//! column values. Partition columns are moved out of the data and into the
//! directory path (`year=2018/month=11/...`), the layout Spark and DuckDB
//! both read back as columns.

use crate::error::{Error, Result};
use arrow::array::UInt32Array;
use arrow::compute::take_record_batch;
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use std::collections::BTreeMap;

/// Directory value used for null partition keys
pub const DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Data file name inside a partition directory
pub const PART_FILE: &str = "part-00000.parquet";

/// Rows of one partition, without the partition columns
#[derive(Debug, Clone)]
pub struct PartitionedBatch {
    /// Directory segments, outermost first (`["year=2018", "month=11"]`)
    pub segments: Vec<String>,
    /// Data columns for this partition
    pub batch: RecordBatch,
}

/// Split a batch by the given partition columns
///
/// With no partition columns the whole batch is returned as a single
/// partition (even when empty). Otherwise partitions come back ordered by
/// their directory values; an empty batch yields no partitions.
pub fn partition_batch(
    batch: &RecordBatch,
    partition_by: &[String],
) -> Result<Vec<PartitionedBatch>> {
    if partition_by.is_empty() {
        return Ok(vec![PartitionedBatch {
            segments: Vec::new(),
            batch: batch.clone(),
        }]);
    }

    let schema = batch.schema();
    let mut key_indices = Vec::with_capacity(partition_by.len());
    for name in partition_by {
        let index = schema.index_of(name).map_err(|_| {
            Error::column_not_found(name, schema.fields().iter().map(|f| f.name().as_str()))
        })?;
        key_indices.push(index);
    }

    let data_indices: Vec<usize> = (0..schema.fields().len())
        .filter(|i| !key_indices.contains(i))
        .collect();
    let data = batch.project(&data_indices)?;

    let options = FormatOptions::default();
    let formatters = key_indices
        .iter()
        .map(|&i| ArrayFormatter::try_new(batch.column(i).as_ref(), &options))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut groups: BTreeMap<Vec<String>, Vec<u32>> = BTreeMap::new();
    for row in 0..batch.num_rows() {
        let values = key_indices
            .iter()
            .zip(&formatters)
            .map(|(&col, formatter)| {
                if batch.column(col).is_null(row) {
                    DEFAULT_PARTITION.to_string()
                } else {
                    formatter.value(row).to_string()
                }
            })
            .collect::<Vec<_>>();
        groups.entry(values).or_default().push(row as u32);
    }

    groups
        .into_iter()
        .map(|(values, rows)| {
            let indices = UInt32Array::from(rows);
            let batch = take_record_batch(&data, &indices)?;
            let segments = partition_by
                .iter()
                .zip(values)
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            Ok(PartitionedBatch { segments, batch })
        })
        .collect()
}
