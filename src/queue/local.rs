use async_trait::async_trait;

use super::{Queue, QueueError, QueueMessage};
use crate::storage::Database;

/// Queue persisted in the metadata database.
///
/// Receiving does not hide messages from later receives; a message is delivered
/// again on every poll until it is acknowledged. Intended for a single consumer.
pub struct LocalQueue {
    db: Database,
}

impl LocalQueue {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Queue for LocalQueue {
    async fn send(&self, body: &str) -> Result<(), QueueError> {
        let seq = self.db.enqueue_message(body)?;
        tracing::trace!(seq, "Enqueued message");
        Ok(())
    }

    async fn receive(&self, max_messages: usize) -> Result<Vec<QueueMessage>, QueueError> {
        let messages = self
            .db
            .peek_messages(max_messages)?
            .into_iter()
            .map(|(seq, message)| QueueMessage {
                id: message.id,
                receipt: seq.to_string(),
                body: message.body,
            })
            .collect();
        Ok(messages)
    }

    async fn ack(&self, receipt: &str) -> Result<(), QueueError> {
        let seq: u64 = receipt
            .parse()
            .map_err(|_| QueueError::Backend(format!("invalid receipt: {receipt}")))?;
        self.db.remove_message(seq)?;
        Ok(())
    }
}
