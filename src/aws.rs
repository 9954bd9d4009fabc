//! Shared AWS SDK configuration for the S3 and SQS backends.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::config::Credentials;

use crate::config::Config;

/// Load SDK configuration for the configured region.
///
/// With `ENV=local` every client is pointed at the emulator endpoint and signs
/// with static test credentials.
pub async fn load_sdk_config(config: &Config) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.cloud.region.clone()));

    if let Some(endpoint) = config.aws_endpoint() {
        tracing::info!(endpoint = %endpoint, "Using local emulator for AWS services");
        loader = loader
            .endpoint_url(endpoint)
            .credentials_provider(Credentials::new("test", "test", None, None, "local-emulator"));
    }

    loader.load().await
}
