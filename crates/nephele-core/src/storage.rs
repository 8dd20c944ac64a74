//! S3 bucket and object operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{CoreError, Result};

/// Largest page `ListObjectsV2` will return
pub const MAX_KEYS_LIMIT: i32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketSummary {
    pub name: String,
    pub creation_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectSummary {
    pub key: String,
    /// Size in bytes
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
    pub storage_class: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObjectPage {
    pub objects: Vec<ObjectSummary>,
    pub next_continuation_token: Option<String>,
    pub is_truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListObjectsOptions {
    pub prefix: Option<String>,
    pub max_keys: i32,
    pub continuation_token: Option<String>,
}

impl Default for ListObjectsOptions {
    fn default() -> Self {
        Self {
            prefix: None,
            max_keys: MAX_KEYS_LIMIT,
            continuation_token: None,
        }
    }
}

#[async_trait]
pub trait StorageApi: Send + Sync {
    async fn list_buckets(&self) -> Result<Vec<BucketSummary>>;

    /// Fetch a single page of objects
    async fn list_objects(&self, bucket: &str, options: &ListObjectsOptions) -> Result<ObjectPage>;

    /// Stream an object body to `dest`, returning the bytes written
    async fn download_object(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64>;
}

pub struct StorageService<S> {
    api: S,
}

impl<S: StorageApi> StorageService<S> {
    pub fn new(api: S) -> Self {
        Self { api }
    }

    pub async fn list_buckets(&self) -> Result<Vec<BucketSummary>> {
        let buckets = self.api.list_buckets().await?;
        debug!("Found {} bucket(s)", buckets.len());
        Ok(buckets)
    }

    pub async fn list_objects(
        &self,
        bucket: &str,
        options: &ListObjectsOptions,
    ) -> Result<ObjectPage> {
        validate_bucket(bucket)?;
        if !(1..=MAX_KEYS_LIMIT).contains(&options.max_keys) {
            return Err(CoreError::Validation(format!(
                "max keys must be between 1 and {}, got {}",
                MAX_KEYS_LIMIT, options.max_keys
            )));
        }

        let page = self.api.list_objects(bucket, options).await?;
        debug!(
            "Listed {} object(s) in {} (truncated={})",
            page.objects.len(),
            bucket,
            page.is_truncated
        );
        Ok(page)
    }

    /// Download `key` to `dest`, or to the key's file name in the current
    /// directory.
    ///
    /// The body is written to a temporary file next to `dest` and renamed
    /// over it only once the transfer has finished, so a failed download
    /// leaves any existing file at `dest` untouched.
    pub async fn download(
        &self,
        bucket: &str,
        key: &str,
        dest: Option<&Path>,
    ) -> Result<(PathBuf, u64)> {
        validate_bucket(bucket)?;
        validate_object_key(key)?;
        let dest = match dest {
            Some(path) => path.to_path_buf(),
            None => default_destination(key)?,
        };

        let io_error = |path: &Path, source: std::io::Error| CoreError::Io {
            path: path.display().to_string(),
            source,
        };

        let parent = match dest.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let partial = tempfile::Builder::new()
            .prefix(".nephele-")
            .suffix(".part")
            .tempfile_in(parent)
            .map_err(|e| io_error(parent, e))?
            .into_temp_path();

        info!("Downloading s3://{}/{} to {}", bucket, key, dest.display());
        // dropping `partial` on the error path removes it
        let bytes = self.api.download_object(bucket, key, &partial).await?;

        partial
            .persist(&dest)
            .map_err(|e| io_error(&dest, e.error))?;
        debug!("Wrote {} byte(s) to {}", bytes, dest.display());
        Ok((dest, bytes))
    }
}

fn validate_bucket(bucket: &str) -> Result<()> {
    if bucket.trim().is_empty() {
        return Err(CoreError::Validation(
            "bucket name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_object_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CoreError::Validation(
            "object key must not be empty".to_string(),
        ));
    }
    if key.ends_with('/') {
        return Err(CoreError::Validation(format!(
            "'{}' is a directory key, not an object",
            key
        )));
    }
    Ok(())
}

/// Last path segment of an object key
pub fn default_destination(key: &str) -> Result<PathBuf> {
    validate_object_key(key)?;
    let file_name = key.rsplit('/').next().unwrap_or(key);
    Ok(PathBuf::from(file_name))
}
