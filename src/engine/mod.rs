//! Execution engines
//!
//! A [`Frame`] only describes a computation. An [`Engine`] evaluates it,
//! either into a single in-memory batch or into a Parquet table.
//!
//! # Overview
//!
//! - [`MemoryEngine`] - evaluates plans with Arrow compute kernels and does
//!   its own I/O through `object_store`
//! - [`DuckDbEngine`] - compiles plans to SQL and lets DuckDB read the JSON
//!   and write the Parquet directly
//! - [`Session`] - the handle every pipeline stage receives; it owns the
//!   chosen engine and builds source frames

mod database;
mod kernels;
mod memory;
mod sql;
mod types;

pub use database::DuckDbEngine;
pub use memory::MemoryEngine;
pub use sql::compile as compile_sql;
pub use types::{WriteSummary, SUCCESS_MARKER};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::output::ParquetWriterConfig;
use crate::plan::{Frame, Sink, Source};
use crate::storage::Location;
use crate::types::EngineKind;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use std::sync::Arc;

/// Evaluates transformation graphs
#[async_trait]
pub trait Engine: Send + Sync {
    /// Short engine name for logs and summaries
    fn name(&self) -> &'static str;

    /// Evaluate a frame into one batch
    async fn collect(&self, frame: &Frame) -> Result<RecordBatch>;

    /// Evaluate a frame and replace the sink's contents with the result
    async fn write(&self, frame: &Frame, sink: &Sink) -> Result<WriteSummary>;
}

/// Execution context shared by all pipeline stages
#[derive(Clone)]
pub struct Session {
    engine: Arc<dyn Engine>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("engine", &self.engine.name())
            .finish()
    }
}

impl Session {
    /// Wrap an engine
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self { engine }
    }

    /// Session backed by the in-process Arrow engine
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryEngine::new()))
    }

    /// Session for the engine and Parquet settings in a config
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let writer = ParquetWriterConfig::from(&config.parquet);
        let engine: Arc<dyn Engine> = match config.engine {
            EngineKind::Memory => Arc::new(MemoryEngine::new().with_writer_config(writer)),
            EngineKind::Duckdb => Arc::new(
                DuckDbEngine::new()?
                    .with_compression(config.parquet.compression)
                    .with_row_group_size(config.parquet.row_group_size),
            ),
        };
        tracing::debug!(engine = engine.name(), "Created session");
        Ok(Self::new(engine))
    }

    /// Name of the underlying engine
    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Frame over the JSON files under `location` matching `pattern`
    pub fn read_json(&self, location: &Location, pattern: &str, schema: SchemaRef) -> Frame {
        Frame::scan(Source::json(location.clone(), pattern, schema))
    }

    /// Evaluate a frame into one batch
    pub async fn collect(&self, frame: &Frame) -> Result<RecordBatch> {
        self.engine.collect(frame).await
    }

    /// Evaluate a frame into a Parquet table, replacing previous contents
    pub async fn write(&self, frame: &Frame, sink: &Sink) -> Result<WriteSummary> {
        self.engine.write(frame, sink).await
    }
}
