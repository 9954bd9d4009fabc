use chrono::Utc;
use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::QueuedMessage;
use super::tables::*;

impl Database {
    // ========================================================================
    // Local queue operations
    // ========================================================================

    /// Append a message to the queue. Returns its sequence number.
    pub fn enqueue_message(&self, body: &str) -> Result<u64, DatabaseError> {
        let write_txn = self.begin_write()?;
        let seq = {
            let mut table = write_txn.open_table(QUEUE_MESSAGES)?;
            let seq = match table.last()? {
                Some((key, _)) => key.value() + 1,
                None => 1,
            };
            let message = QueuedMessage {
                id: uuid::Uuid::new_v4().to_string(),
                body: body.to_string(),
                enqueued_at: Utc::now(),
            };
            let data = rmp_serde::to_vec_named(&message)?;
            table.insert(seq, data.as_slice())?;
            seq
        };
        write_txn.commit()?;
        Ok(seq)
    }

    /// Oldest messages first, without removing them.
    pub fn peek_messages(&self, max: usize) -> Result<Vec<(u64, QueuedMessage)>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(QUEUE_MESSAGES)?;

        let mut messages = Vec::new();
        for entry in table.iter()?.take(max) {
            let (key, value) = entry?;
            let message: QueuedMessage = rmp_serde::from_slice(value.value())?;
            messages.push((key.value(), message));
        }
        Ok(messages)
    }

    /// Remove a message once it has been handled
    pub fn remove_message(&self, seq: u64) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(QUEUE_MESSAGES)?;
            let removed = table.remove(seq)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }
}
