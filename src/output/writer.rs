//! Parquet encoder
//!
//! Encodes Arrow RecordBatches as Parquet, either into any `Write` sink or
//! straight into an in-memory buffer ready for an object store `put`.

use crate::config::ParquetConfig;
use crate::error::{Error, Result};
use crate::types::Compression;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression as ParquetCompression, GzipLevel, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use std::io::Write;

/// Settings applied to every Parquet file written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParquetWriterConfig {
    compression: Compression,
    row_group_size: usize,
    dictionary: bool,
    statistics: bool,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self::from(&ParquetConfig::default())
    }
}

impl From<&ParquetConfig> for ParquetWriterConfig {
    fn from(config: &ParquetConfig) -> Self {
        Self {
            compression: config.compression,
            row_group_size: config.row_group_size.max(1),
            dictionary: true,
            statistics: true,
        }
    }
}

impl ParquetWriterConfig {
    /// Set compression codec
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set maximum rows per row group
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    /// Enable or disable dictionary encoding
    #[must_use]
    pub fn with_dictionary(mut self, enabled: bool) -> Self {
        self.dictionary = enabled;
        self
    }

    /// Enable or disable column statistics
    #[must_use]
    pub fn with_statistics(mut self, enabled: bool) -> Self {
        self.statistics = enabled;
        self
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn row_group_size(&self) -> usize {
        self.row_group_size
    }

    fn build_properties(&self) -> WriterProperties {
        let codec = match self.compression {
            Compression::Snappy => ParquetCompression::SNAPPY,
            Compression::Zstd => ParquetCompression::ZSTD(ZstdLevel::default()),
            Compression::Gzip => ParquetCompression::GZIP(GzipLevel::default()),
            Compression::Uncompressed => ParquetCompression::UNCOMPRESSED,
        };
        let statistics = if self.statistics {
            EnabledStatistics::Page
        } else {
            EnabledStatistics::None
        };
        WriterProperties::builder()
            .set_compression(codec)
            .set_max_row_group_size(self.row_group_size)
            .set_dictionary_enabled(self.dictionary)
            .set_statistics_enabled(statistics)
            .build()
    }
}

/// Parquet writer over any `Write + Send` sink
pub struct ParquetWriter<W: Write + Send> {
    /// Arrow writer
    writer: ArrowWriter<W>,
    /// Number of rows written
    rows_written: usize,
}

impl<W: Write + Send> ParquetWriter<W> {
    /// Create a new Parquet writer
    pub fn new(sink: W, schema: SchemaRef, config: &ParquetWriterConfig) -> Result<Self> {
        let props = config.build_properties();
        let writer = ArrowWriter::try_new(sink, schema, Some(props))
            .map_err(|e| Error::output(format!("Failed to create Parquet writer: {e}")))?;

        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    /// Write a RecordBatch
    pub fn write(&mut self, batch: &RecordBatch) -> Result<()> {
        self.writer
            .write(batch)
            .map_err(|e| Error::output(format!("Failed to write batch: {e}")))?;

        self.rows_written += batch.num_rows();
        Ok(())
    }

    /// Get the number of rows written so far
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Finalize the file and hand back the sink
    pub fn finish(self) -> Result<(W, usize)> {
        let rows = self.rows_written;
        let sink = self
            .writer
            .into_inner()
            .map_err(|e| Error::output(format!("Failed to close Parquet writer: {e}")))?;
        Ok((sink, rows))
    }
}

/// Encode a single RecordBatch as a Parquet file in memory
pub fn encode_batch(batch: &RecordBatch, config: &ParquetWriterConfig) -> Result<Bytes> {
    let mut writer = ParquetWriter::new(Vec::new(), batch.schema(), config)?;
    writer.write(batch)?;
    let (buffer, _) = writer.finish()?;
    Ok(Bytes::from(buffer))
}
