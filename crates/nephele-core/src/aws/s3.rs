use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::DateTime as SmithyDateTime;
use aws_sdk_s3::types::Object;
use chrono::{DateTime, Utc};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::sdk_error;
use crate::error::{CoreError, Result, Service};
use crate::storage::{BucketSummary, ListObjectsOptions, ObjectPage, ObjectSummary, StorageApi};

/// [`StorageApi`] over the S3 SDK client
#[derive(Debug, Clone)]
pub struct S3Backend {
    client: Client,
}

impl S3Backend {
    /// Custom endpoints (emulators) get path-style addressing
    pub fn new(config: &SdkConfig) -> Self {
        let s3_config = aws_sdk_s3::config::Builder::from(config)
            .force_path_style(config.endpoint_url().is_some())
            .build();
        Self {
            client: Client::from_conf(s3_config),
        }
    }
}

#[async_trait]
impl StorageApi for S3Backend {
    async fn list_buckets(&self) -> Result<Vec<BucketSummary>> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| sdk_error(Service::S3, e))?;

        Ok(output
            .buckets()
            .iter()
            .map(|bucket| BucketSummary {
                name: bucket.name().unwrap_or_default().to_string(),
                creation_date: bucket.creation_date().and_then(to_chrono),
            })
            .collect())
    }

    async fn list_objects(&self, bucket: &str, options: &ListObjectsOptions) -> Result<ObjectPage> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .max_keys(options.max_keys)
            .set_prefix(options.prefix.clone())
            .set_continuation_token(options.continuation_token.clone())
            .send()
            .await
            .map_err(|e| sdk_error(Service::S3, e))?;

        Ok(ObjectPage {
            objects: output.contents().iter().map(summarize).collect(),
            next_continuation_token: output.next_continuation_token().map(str::to_string),
            is_truncated: output.is_truncated().unwrap_or(false),
        })
    }

    async fn download_object(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_error(Service::S3, e))?;

        let io_error = |source: std::io::Error| CoreError::Io {
            path: dest.display().to_string(),
            source,
        };

        let mut file = tokio::fs::File::create(dest).await.map_err(io_error)?;
        let mut body = output.body;
        let mut written: u64 = 0;

        while let Some(chunk) = body
            .try_next()
            .await
            .map_err(|e| CoreError::api(Service::S3, None, e.to_string()))?
        {
            file.write_all(&chunk).await.map_err(io_error)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_error)?;

        debug!("Wrote {} byte(s) to {}", written, dest.display());
        Ok(written)
    }
}

fn summarize(object: &Object) -> ObjectSummary {
    ObjectSummary {
        key: object.key().unwrap_or_default().to_string(),
        size: object.size().unwrap_or(0),
        last_modified: object.last_modified().and_then(to_chrono),
        storage_class: object.storage_class().map(|c| c.as_str().to_string()),
    }
}

fn to_chrono(timestamp: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}
