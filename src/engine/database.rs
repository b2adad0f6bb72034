//! DuckDB-based engine
//!
//! Plans are compiled to SQL. DuckDB reads the JSON and writes Parquet at any
//! location itself (local or cloud via `httpfs`), so data never passes
//! through this process on writes.

use super::sql::{compile, copy_statement, literal, partition_source};
use super::types::{WriteSummary, SUCCESS_MARKER};
use super::Engine;
use crate::config::ParquetConfig;
use crate::error::{Error, Result};
use crate::output::PART_FILE;
use crate::plan::{Frame, Plan, Sink, Source};
use crate::storage::Location;
use crate::types::Compression;
use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use bytes::Bytes;
use duckdb::Connection;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Name of the table a write is staged in before it is copied out
const STAGING_TABLE: &str = "__songplay_etl_staging";

/// Query engine using an in-memory DuckDB database
pub struct DuckDbEngine {
    /// DuckDB connection; queries run one at a time
    conn: Arc<Mutex<Connection>>,
    /// Parquet compression codec
    compression: Compression,
    /// Maximum rows per row group
    row_group_size: usize,
    /// Whether httpfs and credentials have been set up
    cloud_ready: AtomicBool,
}

impl std::fmt::Debug for DuckDbEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbEngine")
            .field("compression", &self.compression)
            .field("row_group_size", &self.row_group_size)
            .finish_non_exhaustive()
    }
}

impl DuckDbEngine {
    /// Create an engine over a fresh in-memory database
    pub fn new() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::config(format!("Failed to create DuckDB connection: {e}")))?;
        let defaults = ParquetConfig::default();

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            compression: defaults.compression,
            row_group_size: defaults.row_group_size,
            cloud_ready: AtomicBool::new(false),
        })
    }

    /// Set the Parquet compression codec
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set the maximum rows per row group
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    /// Run blocking DuckDB work off the async runtime
    async fn run<T, F>(&self, task: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| Error::Other("DuckDB connection lock poisoned".to_string()))?;
            task(&conn)
        })
        .await?
    }

    /// Check every location the plan touches and set up cloud access once
    async fn prepare(&self, plan: &Plan, sink: Option<&Location>) -> Result<()> {
        let mut sources = Vec::new();
        collect_sources(plan, &mut sources);

        let mut needs_cloud = false;
        for source in &sources {
            check_location(&source.location)?;
            // DuckDB's own error for an empty glob is less helpful
            if source
                .location
                .list_matching(&source.pattern)
                .await?
                .is_empty()
            {
                return Err(Error::NoInputFiles {
                    pattern: source.url(),
                });
            }
            needs_cloud |= source.location.is_cloud();
        }
        if let Some(location) = sink {
            check_location(location)?;
            needs_cloud |= location.is_cloud();
        }

        if needs_cloud && !self.cloud_ready.load(Ordering::Acquire) {
            self.run(configure_cloud_storage).await?;
            self.cloud_ready.store(true, Ordering::Release);
        }
        Ok(())
    }
}

/// Install `httpfs` and apply credentials from the environment
fn configure_cloud_storage(conn: &Connection) -> Result<()> {
    conn.execute_batch("INSTALL httpfs; LOAD httpfs;")
        .map_err(|e| Error::config(format!("Failed to load httpfs extension: {e}")))?;

    for statement in cloud_settings(|key| std::env::var(key).ok()) {
        conn.execute_batch(&statement)
            .map_err(|e| Error::config(format!("Failed to configure cloud storage: {e}")))?;
    }

    tracing::debug!("Configured DuckDB cloud storage access");
    Ok(())
}

/// `SET` statements for the S3/R2 and GCS credentials found through `lookup`
///
/// Every value is quoted as a SQL literal.
pub(super) fn cloud_settings<F>(lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let set = |name: &str, value: &str| format!("SET {name} = {};", literal(value));
    let mut statements = Vec::new();

    if let (Some(key_id), Some(secret)) = (
        lookup("AWS_ACCESS_KEY_ID"),
        lookup("AWS_SECRET_ACCESS_KEY"),
    ) {
        let region = lookup("AWS_DEFAULT_REGION").unwrap_or_else(|| "us-east-1".to_string());
        statements.push(set("s3_access_key_id", &key_id));
        statements.push(set("s3_secret_access_key", &secret));
        statements.push(set("s3_region", &region));

        // R2, MinIO and other S3-compatible endpoints
        if let Some(endpoint) = lookup("R2_ENDPOINT_URL").or_else(|| lookup("AWS_ENDPOINT")) {
            let host = endpoint
                .trim_start_matches("https://")
                .trim_start_matches("http://");
            statements.push(set("s3_endpoint", host));
            statements.push(set("s3_url_style", "path"));
        }
    }

    if let Some(service_account) = lookup("GOOGLE_SERVICE_ACCOUNT") {
        statements.push(set("gcs_credentials_file", &service_account));
    }

    statements
}

fn collect_sources<'a>(plan: &'a Plan, out: &mut Vec<&'a Source>) {
    if let Plan::Scan(source) = plan {
        out.push(source);
    }
    for input in plan.inputs() {
        collect_sources(input, out);
    }
}

fn check_location(location: &Location) -> Result<()> {
    if location.scheme() == "memory" {
        return Err(Error::config(format!(
            "DuckDB engine cannot access in-memory location {}",
            location.url()
        )));
    }
    Ok(())
}

/// Unique scratch file name
fn scratch_name() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("songplay_etl_{}_{timestamp:x}.parquet", std::process::id())
}

#[async_trait]
impl Engine for DuckDbEngine {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    async fn collect(&self, frame: &Frame) -> Result<RecordBatch> {
        self.prepare(frame.plan(), None).await?;
        let schema = frame.schema()?;
        let query = compile(frame.plan())?;
        tracing::debug!(sql = %query, "Executing DuckDB query");

        // Results come back through a scratch Parquet file
        let scratch = std::env::temp_dir().join(scratch_name());
        let scratch_path = scratch
            .to_str()
            .ok_or_else(|| Error::config("Invalid temp path"))?
            .to_string();
        let copy = copy_statement(
            &query,
            &scratch_path,
            &[],
            Compression::Uncompressed,
            1024 * 1024,
        );

        self.run(move |conn| {
            let result = conn
                .execute_batch(&copy)
                .map_err(Error::from)
                .and_then(|()| {
                    let file = std::fs::File::open(&scratch)?;
                    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
                    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
                    match batches.first() {
                        Some(first) => Ok(concat_batches(&first.schema(), &batches)?),
                        None => Ok(RecordBatch::new_empty(schema)),
                    }
                });
            let _ = std::fs::remove_file(&scratch);
            result
        })
        .await
    }

    async fn write(&self, frame: &Frame, sink: &Sink) -> Result<WriteSummary> {
        let location = &sink.location;
        self.prepare(frame.plan(), Some(location)).await?;

        let schema = frame.schema()?;
        for column in &sink.partition_by {
            if schema.index_of(column).is_err() {
                return Err(Error::column_not_found(
                    column,
                    schema.fields().iter().map(|f| f.name().as_str()),
                ));
            }
        }

        let query = compile(frame.plan())?;
        let target = if sink.partition_by.is_empty() {
            location.url_of(PART_FILE)
        } else {
            location.url()
        };
        let stage = format!("CREATE OR REPLACE TEMP TABLE {STAGING_TABLE} AS {query}");
        let copy = copy_statement(
            &partition_source(STAGING_TABLE, &sink.partition_by),
            &target,
            &sink.partition_by,
            self.compression,
            self.row_group_size,
        );
        tracing::debug!(sql = %stage, "Staging DuckDB result");

        // Evaluate first so a failed run leaves the old table intact
        let rows: i64 = self
            .run(move |conn| {
                conn.execute_batch(&stage)?;
                let rows = conn.query_row(
                    &format!("SELECT COUNT(*) FROM {STAGING_TABLE}"),
                    [],
                    |row| row.get(0),
                )?;
                Ok(rows)
            })
            .await?;

        location.clear().await?;
        if let Some(dir) = location.local_path() {
            std::fs::create_dir_all(&dir)?;
        }

        tracing::debug!(sql = %copy, "Executing DuckDB COPY");
        self.run(move |conn| {
            conn.execute_batch(&copy)?;
            conn.execute_batch(&format!("DROP TABLE IF EXISTS {STAGING_TABLE}"))?;
            Ok(())
        })
        .await?;

        let files = location.list_matching("**/*.parquet").await?;
        let mut summary = WriteSummary::new(location.url());
        summary.rows = usize::try_from(rows).unwrap_or_default();
        summary.files = files.len();
        if !sink.partition_by.is_empty() {
            let prefix = location.prefix();
            summary.partitions = files
                .iter()
                .filter_map(|path| {
                    let key = path.as_ref();
                    let relative = key.strip_prefix(prefix).unwrap_or(key);
                    relative.rsplit_once('/').map(|(dir, _)| dir.to_string())
                })
                .collect::<BTreeSet<_>>()
                .len();
        }

        location.put(SUCCESS_MARKER, Bytes::new()).await?;
        Ok(summary)
    }
}
