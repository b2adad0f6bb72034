//! JSON to Arrow decoding

use crate::error::{Error, Result};
use arrow::datatypes::SchemaRef;
use arrow::json::reader::{Decoder, ReaderBuilder};
use arrow::record_batch::RecordBatch;
use serde_json::Value;
use std::sync::Arc;

/// Default number of records per output batch
const DEFAULT_BATCH_SIZE: usize = 8192;

/// Decodes JSON records into batches of a fixed schema
#[derive(Debug, Clone)]
pub struct JsonRecordDecoder {
    schema: SchemaRef,
    batch_size: usize,
}

impl JsonRecordDecoder {
    /// Create a decoder for the given schema
    pub fn new(schema: SchemaRef) -> Self {
        Self {
            schema,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the number of records per batch
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Target schema
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Decode one file; `path` is only used in error messages
    pub fn decode(&self, path: &str, data: &[u8]) -> Result<Vec<RecordBatch>> {
        let mut decoder = ReaderBuilder::new(Arc::clone(&self.schema))
            .with_batch_size(self.batch_size)
            .with_coerce_primitive(true)
            .build_decoder()
            .map_err(|e| Error::decode(path, format!("Failed to create decoder: {e}")))?;

        let mut batches = Vec::new();
        let mut pending: Vec<Value> = Vec::with_capacity(self.batch_size);
        let stream = serde_json::Deserializer::from_slice(data).into_iter::<Value>();

        for (index, value) in stream.enumerate() {
            let value = value
                .map_err(|e| Error::decode(path, format!("record {}: {e}", index + 1)))?;

            match value {
                Value::Object(_) => pending.push(value),
                Value::Array(items) => {
                    for item in items {
                        if !item.is_object() {
                            return Err(Error::decode(
                                path,
                                format!("record {}: array items must be objects", index + 1),
                            ));
                        }
                        pending.push(item);
                    }
                }
                other => {
                    return Err(Error::decode(
                        path,
                        format!("record {}: expected a JSON object, got {other}", index + 1),
                    ));
                }
            }

            if pending.len() >= self.batch_size {
                self.flush(path, &mut decoder, &mut pending, &mut batches)?;
            }
        }

        self.flush(path, &mut decoder, &mut pending, &mut batches)?;
        Ok(batches)
    }

    fn flush(
        &self,
        path: &str,
        decoder: &mut Decoder,
        pending: &mut Vec<Value>,
        batches: &mut Vec<RecordBatch>,
    ) -> Result<()> {
        if pending.is_empty() {
            return Ok(());
        }
        decoder
            .serialize(pending)
            .map_err(|e| Error::decode(path, e.to_string()))?;
        pending.clear();
        while let Some(batch) = decoder
            .flush()
            .map_err(|e| Error::decode(path, e.to_string()))?
        {
            batches.push(batch);
        }
        Ok(())
    }
}
