//! Clip object storage (S3-compatible, e.g. Backblaze B2)
//!
//! Accepted clips are stored under `<memory id>/<uuid>.mp4` and read back
//! through short-lived presigned URLs.

use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    presigning::PresigningConfig,
    primitives::ByteStream,
    Client,
};
use axum::body::Bytes;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("S3 error: {0}")]
    S3Error(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid memory id: {0}")]
    InvalidMemoryId(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// S3 connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint (B2, MinIO); AWS default when absent
    pub endpoint: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Lifetime of presigned GET URLs
    pub url_expiry: Duration,
}

#[async_trait]
pub trait ClipStore: Send + Sync {
    /// Store clip bytes under `key`
    async fn put_clip(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()>;

    /// Presigned GET URL for `key`
    async fn signed_url(&self, key: &str) -> StorageResult<String>;
}

/// Object key for a new clip of `memory_id`
///
/// The id must be a single non-empty path segment.
pub fn clip_key(memory_id: &str) -> StorageResult<String> {
    let memory_id = memory_id.trim();
    if memory_id.is_empty()
        || memory_id.contains('/')
        || memory_id.contains('\\')
        || memory_id.contains("..")
    {
        return Err(StorageError::InvalidMemoryId(memory_id.to_string()));
    }
    Ok(format!("{}/{}.mp4", memory_id, Uuid::new_v4()))
}

/// S3 clip store
pub struct S3ClipStore {
    client: Client,
    bucket: String,
    url_expiry: Duration,
}

impl S3ClipStore {
    pub fn new(config: S3Config) -> StorageResult<Self> {
        if config.bucket.trim().is_empty() {
            return Err(StorageError::InvalidConfig("bucket name is empty".to_string()));
        }

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "memoria-clip-store",
        );

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .behavior_version_latest();

        if let Some(endpoint) = config.endpoint {
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint)
                .force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(s3_config_builder.build()),
            bucket: config.bucket,
            url_expiry: config.url_expiry,
        })
    }
}

#[async_trait]
impl ClipStore for S3ClipStore {
    async fn put_clip(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()> {
        let size = data.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StorageError::S3Error(e.to_string()))?;

        tracing::info!(key = %key, bytes = size, "Clip stored");
        Ok(())
    }

    async fn signed_url(&self, key: &str) -> StorageResult<String> {
        let presigning = PresigningConfig::expires_in(self.url_expiry)
            .map_err(|e| StorageError::InvalidConfig(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::S3Error(e.to_string()))?;

        Ok(request.uri().to_string())
    }
}
