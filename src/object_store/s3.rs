use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

use super::{ObjectStore, ObjectStoreError};

/// Amazon S3 (or S3-compatible emulator) object store backend.
pub struct S3Store {
    bucket: String,
    client: Client,
}

impl S3Store {
    /// Build a store from shared SDK configuration.
    ///
    /// Emulators need path-style addressing (`{endpoint}/{bucket}/{key}`), so
    /// `force_path_style` should be set whenever an endpoint override is in use.
    pub fn new(sdk_config: &aws_config::SdkConfig, bucket: &str, force_path_style: bool) -> Self {
        let s3_config = aws_sdk_s3::config::Builder::from(sdk_config)
            .force_path_style(force_path_style)
            .build();

        Self {
            bucket: bucket.to_string(),
            client: Client::from_conf(s3_config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<(), ObjectStoreError> {
        let size = data.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    error = %DisplayErrorContext(&e),
                    "S3 upload failed"
                );
                ObjectStoreError::Backend(format!("S3 upload failed: {}", DisplayErrorContext(&e)))
            })?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    ObjectStoreError::NotFound(key.to_string())
                } else {
                    ObjectStoreError::Backend(format!(
                        "S3 download failed: {}",
                        DisplayErrorContext(&e)
                    ))
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?
            .into_bytes();

        Ok(data)
    }
}
