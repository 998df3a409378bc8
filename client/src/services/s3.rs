//! S3 Storage Client
//!
//! Stores profile images in S3-compatible storage.
//! Supports any S3-compatible backend: AWS S3, MinIO, Backblaze B2, Cloudflare R2.

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::{
    config::{Credentials, SharedCredentialsProvider, StalledStreamProtectionConfig},
    primitives::ByteStream,
    Client,
};
use bytes::Bytes;
use tracing::{debug, info};
use url::Url;

use super::{ServiceError, ServiceResult, StorageService};
use crate::config::ClientConfig;

/// S3 client wrapper with configuration.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    endpoint: Option<String>,
    public_url: Option<String>,
}

impl S3Storage {
    /// Create a new S3 client from configuration.
    ///
    /// Uses path-style addressing when a custom endpoint is configured.
    pub fn new(config: &ClientConfig) -> Self {
        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .region(Region::new(config.s3_region.clone()))
            .stalled_stream_protection(StalledStreamProtectionConfig::disabled());

        // Configure credentials from environment
        if let (Ok(access_key), Ok(secret_key)) = (
            std::env::var("AWS_ACCESS_KEY_ID"),
            std::env::var("AWS_SECRET_ACCESS_KEY"),
        ) {
            let credentials = Credentials::new(access_key, secret_key, None, None, "environment");
            s3_config_builder =
                s3_config_builder.credentials_provider(SharedCredentialsProvider::new(credentials));
        }

        if let Some(endpoint) = &config.s3_endpoint {
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint)
                .force_path_style(true); // Required for MinIO and most S3-compatible backends
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!(
            bucket = %config.s3_bucket,
            endpoint = ?config.s3_endpoint,
            "S3 storage initialized"
        );

        Self {
            client,
            bucket: config.s3_bucket.clone(),
            endpoint: config.s3_endpoint.clone(),
            public_url: config.s3_public_url.clone(),
        }
    }

    /// Get the bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Public URL an object is served from.
///
/// Prefers the configured public base (`{public}/{key}`), then the custom
/// endpoint in path style (`{endpoint}/{bucket}/{key}`), then the standard
/// virtual-hosted AWS form.
fn public_object_url(
    public_url: Option<&str>,
    endpoint: Option<&str>,
    bucket: &str,
    key: &str,
) -> ServiceResult<String> {
    let (base, segments) = match (public_url, endpoint) {
        (Some(public), _) => (public.to_string(), vec![key]),
        (None, Some(endpoint)) => (endpoint.to_string(), vec![bucket, key]),
        (None, None) => (format!("https://{bucket}.s3.amazonaws.com"), vec![key]),
    };

    let mut url = Url::parse(&base)
        .map_err(|e| ServiceError::new("storage/invalid-url", format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| ServiceError::new("storage/invalid-url", base.clone()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.into())
}

#[async_trait]
impl StorageService for S3Storage {
    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> ServiceResult<()> {
        let size = data.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| ServiceError::new("storage/unknown", format!("Upload failed: {e}")))?;

        debug!(bucket = %self.bucket, key, size, "Object uploaded");
        Ok(())
    }

    async fn download_url(&self, key: &str) -> ServiceResult<String> {
        if let Err(e) = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            let err = e.into_service_error();
            return Err(if err.is_not_found() {
                ServiceError::new("storage/object-not-found", format!("No object at {key}"))
            } else {
                ServiceError::new("storage/unknown", err.to_string())
            });
        }

        public_object_url(
            self.public_url.as_deref(),
            self.endpoint.as_deref(),
            &self.bucket,
            key,
        )
    }
}
