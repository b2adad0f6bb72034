//! In-process engine on Arrow compute kernels

use super::kernels;
use super::types::{WriteSummary, SUCCESS_MARKER};
use super::Engine;
use crate::decode::JsonRecordDecoder;
use crate::error::{Error, Result};
use crate::output::{encode_batch, partition_batch, ParquetWriterConfig, PART_FILE};
use crate::plan::{Frame, Plan, Sink, Source};
use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use futures::{stream, StreamExt, TryStreamExt};
use std::sync::Arc;

/// Number of files fetched concurrently during a scan
const READ_CONCURRENCY: usize = 16;

/// Evaluates plans in memory
///
/// Every node is fully materialized before its parent runs, which is fine
/// for datasets that fit in memory and keeps the operators simple.
#[derive(Debug, Clone)]
pub struct MemoryEngine {
    writer: ParquetWriterConfig,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEngine {
    /// Create an engine with default Parquet settings
    pub fn new() -> Self {
        Self {
            writer: ParquetWriterConfig::default(),
        }
    }

    /// Set Parquet writer settings
    #[must_use]
    pub fn with_writer_config(mut self, writer: ParquetWriterConfig) -> Self {
        self.writer = writer;
        self
    }

    fn execute<'a>(&'a self, plan: &'a Plan) -> BoxFuture<'a, Result<RecordBatch>> {
        async move {
            match plan {
                Plan::Scan(source) => self.scan(source).await,
                Plan::Values(batch) => Ok(batch.clone()),
                Plan::Filter { input, predicate } => {
                    let batch = self.execute(input).await?;
                    kernels::filter(&batch, predicate)
                }
                Plan::Project { input, exprs } => {
                    let batch = self.execute(input).await?;
                    kernels::project(&batch, exprs, plan.schema()?)
                }
                Plan::WithColumn { input, name, expr } => {
                    let batch = self.execute(input).await?;
                    kernels::with_column(&batch, name, expr, plan.schema()?)
                }
                Plan::Rename { input, .. } => {
                    let batch = self.execute(input).await?;
                    kernels::rename(&batch, plan.schema()?)
                }
                Plan::Distinct { input } => {
                    let batch = self.execute(input).await?;
                    kernels::distinct(&batch)
                }
                Plan::Sort { input, keys } => {
                    let batch = self.execute(input).await?;
                    kernels::sort(&batch, keys)
                }
                Plan::Join {
                    left,
                    right,
                    on,
                    join_type,
                } => {
                    let schema = plan.schema()?;
                    let (left, right) =
                        futures::try_join!(self.execute(left), self.execute(right))?;
                    kernels::join(&left, &right, on, *join_type, schema)
                }
            }
        }
        .boxed()
    }

    /// Read and decode every file matched by the source
    async fn scan(&self, source: &Source) -> Result<RecordBatch> {
        let files = source.location.list_matching(&source.pattern).await?;
        if files.is_empty() {
            return Err(Error::NoInputFiles {
                pattern: source.url(),
            });
        }

        let decoder = JsonRecordDecoder::new(Arc::clone(&source.schema));
        let decoder = &decoder;
        let location = &source.location;
        let decoded: Vec<Vec<RecordBatch>> = stream::iter(files.iter().cloned())
            .map(move |path| async move {
                let path = &path;
                let data = location.get(path).await?;
                decoder.decode(path.as_ref(), &data)
            })
            .buffered(READ_CONCURRENCY)
            .try_collect()
            .await?;

        let batches: Vec<RecordBatch> = decoded.into_iter().flatten().collect();
        let batch = concat_batches(&source.schema, &batches)?;
        tracing::debug!(
            source = %source.url(),
            files = files.len(),
            rows = batch.num_rows(),
            "Scanned JSON input"
        );
        Ok(batch)
    }
}

#[async_trait]
impl Engine for MemoryEngine {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn collect(&self, frame: &Frame) -> Result<RecordBatch> {
        self.execute(frame.plan()).await
    }

    async fn write(&self, frame: &Frame, sink: &Sink) -> Result<WriteSummary> {
        // Evaluate before clearing so a failed run leaves the old table intact
        let batch = self.execute(frame.plan()).await?;
        let partitions = partition_batch(&batch, &sink.partition_by)?;

        let location = &sink.location;
        location.clear().await?;

        let mut summary = WriteSummary::new(location.url());
        if !sink.partition_by.is_empty() {
            summary.partitions = partitions.len();
        }

        for partition in &partitions {
            let data = encode_batch(&partition.batch, &self.writer)?;
            let path = location.object_path_from_parts(
                partition
                    .segments
                    .iter()
                    .map(String::as_str)
                    .chain(std::iter::once(PART_FILE)),
            );
            let written = location.put_object(&path, data).await?;
            tracing::debug!(
                file = %written,
                rows = partition.batch.num_rows(),
                "Wrote Parquet file"
            );
            summary.add_file(partition.batch.num_rows());
        }

        location.put(SUCCESS_MARKER, Bytes::new()).await?;
        Ok(summary)
    }
}
