//! Asynchronous processing worker.
//!
//! Consumes object-created notifications, reads the referenced object, and
//! upserts a processing result for its file. Failures are logged and the
//! record is abandoned; nothing is retried by the worker itself.

mod summary;

pub use summary::ContentSummary;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::WorkerConfig;
use crate::object_store::{ObjectStore, ObjectStoreError};
use crate::queue::{EventRecord, ObjectCreatedEvent, Queue, QueueError};
use crate::storage::models::{file_id_from_key, ProcessingResult};
use crate::storage::{Database, DatabaseError};
use crate::AppState;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Malformed notification: {0}")]
    MalformedMessage(String),
    #[error("Malformed object key: {0}")]
    MalformedKey(String),
    #[error("Notification for bucket {0} ignored")]
    ForeignBucket(String),
    #[error("Failed to fetch object {key}: {source}")]
    Fetch {
        key: String,
        #[source]
        source: ObjectStoreError,
    },
    #[error("No file record for id {0}")]
    UnknownFile(String),
    #[error("Failed to store processing result: {0}")]
    Database(#[from] DatabaseError),
}

pub struct Worker {
    config: WorkerConfig,
    db: Database,
    object_store: Arc<dyn ObjectStore>,
    queue: Arc<dyn Queue>,
}

impl Worker {
    pub fn new(
        config: WorkerConfig,
        db: Database,
        object_store: Arc<dyn ObjectStore>,
        queue: Arc<dyn Queue>,
    ) -> Self {
        Self {
            config,
            db,
            object_store,
            queue,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.config.worker.clone(),
            state.db.clone(),
            Arc::clone(&state.object_store),
            Arc::clone(&state.queue),
        )
    }

    /// Handle one notification body. Records are processed sequentially and
    /// independently; the returned vector has one entry per record (or a single
    /// error when the body cannot be decoded).
    pub async fn handle_message(&self, body: &str) -> Vec<Result<ProcessingResult, ProcessError>> {
        let event: ObjectCreatedEvent = match serde_json::from_str(body) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping undecodable notification");
                return vec![Err(ProcessError::MalformedMessage(e.to_string()))];
            }
        };

        let mut outcomes = Vec::with_capacity(event.records.len());
        for record in &event.records {
            let outcome = self.process_record(record).await;
            match &outcome {
                Ok(result) => {
                    tracing::info!(file_id = %result.file_id, result = %result.result, "Processed file");
                }
                Err(e @ (ProcessError::MalformedKey(_) | ProcessError::ForeignBucket(_))) => {
                    tracing::warn!(error = %e, "Skipping notification record");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to process notification record");
                }
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn process_record(&self, record: &EventRecord) -> Result<ProcessingResult, ProcessError> {
        let bucket = &record.s3.bucket.name;
        if bucket != self.object_store.bucket() {
            return Err(ProcessError::ForeignBucket(bucket.clone()));
        }

        let key = record.s3.object.decoded_key();
        let file_id = file_id_from_key(&key)
            .ok_or_else(|| ProcessError::MalformedKey(key.clone()))?
            .to_string();

        let data = self
            .object_store
            .get(&key)
            .await
            .map_err(|source| ProcessError::Fetch {
                key: key.clone(),
                source,
            })?;

        let text = String::from_utf8_lossy(&data);
        let summary = ContentSummary::of(&text);
        let result = ProcessingResult::completed(&file_id, summary.describe());

        self.db
            .record_result(&result)?
            .ok_or(ProcessError::UnknownFile(file_id))
    }

    /// Receive one batch, handle each message in order and acknowledge it.
    /// Returns the number of messages received.
    pub async fn run_batch(&self) -> Result<usize, QueueError> {
        let messages = self.queue.receive(self.config.batch_size).await?;
        let count = messages.len();

        for message in messages {
            let outcomes = self.handle_message(&message.body).await;
            tracing::debug!(
                message_id = %message.id,
                records = outcomes.len(),
                failed = outcomes.iter().filter(|o| o.is_err()).count(),
                "Handled message"
            );

            // Acknowledge regardless of outcome; a failed ack means redelivery.
            if let Err(e) = self.queue.ack(&message.receipt).await {
                tracing::warn!(message_id = %message.id, error = %e, "Failed to acknowledge message");
            }
        }

        Ok(count)
    }

    /// Spawn the polling loop as a background task.
    pub fn start(self) -> JoinHandle<()> {
        let idle = Duration::from_millis(self.config.poll_interval_ms);
        tokio::spawn(async move {
            tracing::info!(batch_size = self.config.batch_size, "Worker started");
            loop {
                match self.run_batch().await {
                    Ok(0) => tokio::time::sleep(idle).await,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to receive messages");
                        tokio::time::sleep(idle).await;
                    }
                }
            }
        })
    }
}
