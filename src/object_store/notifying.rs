use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use super::{ObjectStore, ObjectStoreError};
use crate::queue::{ObjectCreatedEvent, Queue};

/// Publishes an object-created notification to a queue after every successful put.
///
/// Stands in for bucket event notifications when the backing store has none
/// (local filesystem) or they are not configured. Notification failures are
/// logged and do not fail the put, matching out-of-band bucket notifications.
pub struct NotifyingStore {
    inner: Arc<dyn ObjectStore>,
    queue: Arc<dyn Queue>,
}

impl NotifyingStore {
    pub fn new(inner: Arc<dyn ObjectStore>, queue: Arc<dyn Queue>) -> Self {
        Self { inner, queue }
    }
}

#[async_trait]
impl ObjectStore for NotifyingStore {
    fn bucket(&self) -> &str {
        self.inner.bucket()
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<(), ObjectStoreError> {
        self.inner.put(key, data).await?;

        let event = ObjectCreatedEvent::single(self.inner.bucket(), key);
        let body = match serde_json::to_string(&event) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Failed to encode object-created notification");
                return Ok(());
            }
        };

        if let Err(e) = self.queue.send(&body).await {
            tracing::error!(key = %key, error = %e, "Failed to publish object-created notification");
        } else {
            tracing::debug!(key = %key, "Published object-created notification");
        }

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        self.inner.get(key).await
    }
}
