//! Durable at-least-once message queues feeding the processing worker.
//!
//! A message stays in the queue until it is acknowledged. A consumer that
//! crashes or fails to acknowledge sees the message again, so handlers must
//! tolerate redelivery.

mod event;
mod local;
mod sqs;

pub use event::{EventBucket, EventObject, EventRecord, ObjectCreatedEvent, S3Entity};
pub use local::LocalQueue;
pub use sqs::SqsQueue;

use async_trait::async_trait;
use thiserror::Error;

use crate::storage::DatabaseError;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue backend error: {0}")]
    Backend(String),
    #[error("Queue storage error: {0}")]
    Database(#[from] DatabaseError),
}

/// A received message. `receipt` identifies this delivery for acknowledgement.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueMessage {
    pub id: String,
    pub receipt: String,
    pub body: String,
}

#[async_trait]
pub trait Queue: Send + Sync {
    async fn send(&self, body: &str) -> Result<(), QueueError>;
    /// Receive up to `max_messages`, oldest first. May return an empty batch.
    async fn receive(&self, max_messages: usize) -> Result<Vec<QueueMessage>, QueueError>;
    /// Acknowledge (delete) a handled message
    async fn ack(&self, receipt: &str) -> Result<(), QueueError>;
}
