//! S3 client implementation.

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::keys::StorageKey;
use crate::public_url::PublicUrlTemplate;
use crate::store::ObjectStore;

/// Configuration for the S3 client.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Bucket name
    pub bucket: String,
    /// Region, e.g. "us-east-1"
    pub region: String,
    /// Custom S3 API endpoint (MinIO, R2, ...)
    pub endpoint_url: Option<String>,
    /// Public base URL for durable references; defaults to the virtual-hosted AWS URL
    pub public_base_url: Option<String>,
    /// Explicit access key; the default AWS credential chain is used when unset
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl S3Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            bucket: std::env::var("S3_BUCKET")
                .map_err(|_| StorageError::config_error("S3_BUCKET not set"))?,
            region: std::env::var("S3_REGION")
                .map_err(|_| StorageError::config_error("S3_REGION not set"))?,
            endpoint_url: std::env::var("S3_ENDPOINT_URL").ok(),
            public_base_url: std::env::var("S3_PUBLIC_BASE_URL").ok(),
            access_key_id: std::env::var("S3_ACCESS_KEY_ID").ok(),
            secret_access_key: std::env::var("S3_SECRET_ACCESS_KEY").ok(),
        })
    }

    /// Template used to turn keys into durable references.
    pub fn url_template(&self) -> StorageResult<PublicUrlTemplate> {
        match &self.public_base_url {
            Some(base) => PublicUrlTemplate::base_url(base),
            None => Ok(PublicUrlTemplate::virtual_hosted(&self.bucket, &self.region)),
        }
    }
}

/// [`ObjectStore`] backed by S3 (or an S3-compatible endpoint).
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    urls: PublicUrlTemplate,
}

impl S3ObjectStore {
    /// Create a new S3 client from configuration.
    pub async fn new(config: S3Config) -> StorageResult<Self> {
        let urls = config.url_template()?;

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = Builder::from(&shared);

        if let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            builder = builder.credentials_provider(Credentials::new(key_id, secret, None, None, "vingest"));
        }

        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket,
            urls,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        let config = S3Config::from_env()?;
        Self::new(config).await
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(
        &self,
        local_path: &Path,
        key: &StorageKey,
        content_type: &str,
    ) -> StorageResult<String> {
        debug!("Uploading {} to {}", local_path.display(), key);

        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        let url = self.urls.url_for(key);
        info!("Uploaded {} to {}", local_path.display(), url);
        Ok(url)
    }

    /// Head the bucket.
    async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::config_error(format!("S3 connectivity check failed: {}", e)))?;
        Ok(())
    }
}
