//! Object storage locations (S3, R2, GCS, Azure, local)

use super::glob::Glob;
use crate::error::{Error, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::path::PathBuf;
use std::sync::Arc;

/// A directory-like location inside an object store
///
/// Holds the store client, the key prefix within it, and the URL root used
/// when the location has to be handed to an engine that does its own I/O.
#[derive(Debug, Clone)]
pub struct Location {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Key prefix within the bucket/container, without surrounding slashes
    prefix: String,
    /// URL scheme (s3, r2, gs, az, file, memory)
    scheme: String,
    /// URL of the store root, e.g. `s3://bucket` or `/data/lake`
    root: String,
}

impl Location {
    /// Parse a location URL and create the matching object store
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` or `s3a://bucket/path/` - AWS S3
    /// - `r2://bucket/path/` - Cloudflare R2 (S3-compatible)
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `/local/path/`, `./path/` or `file:///path` - Local filesystem (must exist)
    pub fn parse(url: &str) -> Result<Self> {
        if url.starts_with("s3://") || url.starts_with("s3a://") {
            Self::parse_s3(url, false)
        } else if url.starts_with("r2://") {
            Self::parse_s3(url, true)
        } else if url.starts_with("gs://") {
            Self::parse_gcs(url)
        } else if url.starts_with("az://") {
            Self::parse_azure(url)
        } else {
            Self::parse_local(url, false)
        }
    }

    /// Like [`Location::parse`], but creates a missing local directory
    pub fn create(url: &str) -> Result<Self> {
        if url.contains("://") && !url.starts_with("file://") {
            Self::parse(url)
        } else {
            Self::parse_local(url, true)
        }
    }

    /// Wrap an existing store, e.g. `object_store::memory::InMemory` in tests
    pub fn from_store(
        store: Arc<dyn ObjectStore>,
        scheme: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        let scheme = scheme.into();
        Self {
            store,
            prefix: trim_slashes(&prefix.into()).to_string(),
            root: format!("{scheme}://"),
            scheme,
        }
    }

    /// Split `bucket/some/prefix` into bucket and prefix
    fn split_bucket(without_scheme: &str) -> (&str, String) {
        match without_scheme.find('/') {
            Some(idx) => (
                &without_scheme[..idx],
                trim_slashes(&without_scheme[idx + 1..]).to_string(),
            ),
            None => (without_scheme, String::new()),
        }
    }

    /// Parse S3 or R2 URL
    fn parse_s3(url: &str, is_r2: bool) -> Result<Self> {
        let without_scheme = url
            .strip_prefix("s3://")
            .or_else(|| url.strip_prefix("s3a://"))
            .or_else(|| url.strip_prefix("r2://"))
            .ok_or_else(|| Error::config(format!("Invalid S3 URL: {url}")))?;
        let scheme = if is_r2 { "r2" } else { "s3" };

        let (bucket, prefix) = Self::split_bucket(without_scheme);
        if bucket.is_empty() {
            return Err(Error::config(format!("Missing bucket in URL: {url}")));
        }

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

        // R2 endpoint: https://<account_id>.r2.cloudflarestorage.com
        // AWS_ENDPOINT is read by from_env(), R2_ENDPOINT_URL takes precedence
        if is_r2 {
            if let Ok(endpoint) = std::env::var("R2_ENDPOINT_URL") {
                builder = builder.with_endpoint(endpoint);
            }
        }

        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create {scheme} client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            // DuckDB only understands s3://, so s3a:// is normalized here
            root: format!("s3://{bucket}"),
            scheme: scheme.to_string(),
        })
    }

    /// Parse GCS URL
    fn parse_gcs(url: &str) -> Result<Self> {
        let without_scheme = url
            .strip_prefix("gs://")
            .ok_or_else(|| Error::config(format!("Invalid GCS URL: {url}")))?;

        let (bucket, prefix) = Self::split_bucket(without_scheme);

        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            root: format!("gs://{bucket}"),
            scheme: "gs".to_string(),
        })
    }

    /// Parse Azure Blob URL
    fn parse_azure(url: &str) -> Result<Self> {
        let without_scheme = url
            .strip_prefix("az://")
            .ok_or_else(|| Error::config(format!("Invalid Azure URL: {url}")))?;

        let (container, prefix) = Self::split_bucket(without_scheme);

        let store = MicrosoftAzureBuilder::from_env()
            .with_container_name(container)
            .build()
            .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            root: format!("az://{container}"),
            scheme: "az".to_string(),
        })
    }

    /// Parse local filesystem path
    fn parse_local(path: &str, create: bool) -> Result<Self> {
        let path = path.strip_prefix("file://").unwrap_or(path);
        let trimmed = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };

        if create {
            std::fs::create_dir_all(trimmed)
                .map_err(|e| Error::config(format!("Failed to create directory {trimmed}: {e}")))?;
        } else if !std::path::Path::new(trimmed).is_dir() {
            return Err(Error::FileNotFound {
                path: trimmed.to_string(),
            });
        }

        let store = LocalFileSystem::new_with_prefix(trimmed)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: String::new(),
            root: trimmed.to_string(),
            scheme: "file".to_string(),
        })
    }

    /// Location of a sub-directory
    #[must_use]
    pub fn child(&self, name: &str) -> Location {
        let name = trim_slashes(name);
        let prefix = if self.prefix.is_empty() {
            name.to_string()
        } else if name.is_empty() {
            self.prefix.clone()
        } else {
            format!("{}/{name}", self.prefix)
        };
        Self {
            store: Arc::clone(&self.store),
            prefix,
            scheme: self.scheme.clone(),
            root: self.root.clone(),
        }
    }

    /// Check if this is a cloud location (not local)
    pub fn is_cloud(&self) -> bool {
        !matches!(self.scheme.as_str(), "file" | "memory")
    }

    /// Get the scheme (s3, r2, gs, az, file, memory)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Key prefix within the store
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Full URL of the location
    pub fn url(&self) -> String {
        if self.prefix.is_empty() {
            self.root.clone()
        } else if self.root.ends_with("://") {
            format!("{}{}", self.root, self.prefix)
        } else {
            format!("{}/{}", self.root, self.prefix)
        }
    }

    /// URL of a path relative to this location
    pub fn url_of(&self, relative: &str) -> String {
        let base = self.url();
        if base.ends_with('/') {
            format!("{base}{}", trim_slashes(relative))
        } else {
            format!("{base}/{}", trim_slashes(relative))
        }
    }

    /// Filesystem path, for local locations only
    pub fn local_path(&self) -> Option<PathBuf> {
        (self.scheme == "file").then(|| PathBuf::from(self.url()))
    }

    /// Object key for a path relative to this location
    fn object_path(&self, relative: &str) -> ObjectPath {
        let relative = trim_slashes(relative);
        if self.prefix.is_empty() {
            ObjectPath::from(relative)
        } else if relative.is_empty() {
            ObjectPath::from(self.prefix.as_str())
        } else {
            ObjectPath::from(format!("{}/{relative}", self.prefix))
        }
    }

    /// Object key built from individual path segments, each escaped separately
    pub fn object_path_from_parts<'a>(
        &self,
        parts: impl IntoIterator<Item = &'a str>,
    ) -> ObjectPath {
        let mut path = self.object_path("");
        for part in parts {
            path = path.child(part);
        }
        path
    }

    /// List objects whose path relative to this location matches a glob
    ///
    /// Results are sorted by key so reads are deterministic.
    pub async fn list_matching(&self, pattern: &str) -> Result<Vec<ObjectPath>> {
        let glob = Glob::new(pattern)?;
        let list_prefix = self.object_path(glob.literal_prefix());
        let strip = if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", self.prefix)
        };

        let metas: Vec<_> = self.store.list(Some(&list_prefix)).try_collect().await?;

        let mut matched: Vec<ObjectPath> = metas
            .into_iter()
            .map(|meta| meta.location)
            .filter(|location| {
                let key = location.as_ref();
                let relative = key.strip_prefix(strip.as_str()).unwrap_or(key);
                glob.is_match(relative)
            })
            .collect();
        matched.sort();

        tracing::debug!(
            location = %self.url(),
            pattern,
            files = matched.len(),
            "Listed input files"
        );
        Ok(matched)
    }

    /// Read a whole object
    pub async fn get(&self, path: &ObjectPath) -> Result<Bytes> {
        let result = self.store.get(path).await?;
        Ok(result.bytes().await?)
    }

    /// Write bytes to an object given by its full key
    pub async fn put_object(&self, path: &ObjectPath, data: Bytes) -> Result<String> {
        self.store
            .put(path, data.into())
            .await
            .map_err(|e| Error::storage(format!("Failed to write {path}: {e}")))?;
        Ok(self.display_key(path))
    }

    /// Write bytes to a path relative to this location
    pub async fn put(&self, relative: &str, data: Bytes) -> Result<String> {
        let path = self.object_path(relative);
        self.put_object(&path, data).await
    }

    /// Delete every object below this location, returning how many were removed
    pub async fn clear(&self) -> Result<usize> {
        let prefix = self.object_path("");
        let metas: Vec<_> = self.store.list(Some(&prefix)).try_collect().await?;
        let count = metas.len();
        for meta in metas {
            self.store.delete(&meta.location).await?;
        }
        if count > 0 {
            tracing::debug!(location = %self.url(), objects = count, "Cleared location");
        }
        Ok(count)
    }

    /// Human-readable URL of an object key
    fn display_key(&self, path: &ObjectPath) -> String {
        if self.scheme == "file" {
            format!("{}/{path}", self.root)
        } else if self.root.ends_with("://") {
            format!("{}{path}", self.root)
        } else {
            format!("{}/{path}", self.root)
        }
    }
}

fn trim_slashes(s: &str) -> &str {
    s.trim_matches('/')
}
