use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::Client;

use super::{Queue, QueueError, QueueMessage};

/// Amazon SQS queue backend. Receives use long polling.
pub struct SqsQueue {
    client: Client,
    queue_url: String,
    wait_time_seconds: i32,
}

impl SqsQueue {
    pub fn new(sdk_config: &aws_config::SdkConfig, queue_url: &str, wait_time_seconds: u32) -> Self {
        Self {
            client: Client::new(sdk_config),
            queue_url: queue_url.to_string(),
            wait_time_seconds: wait_time_seconds.min(20) as i32,
        }
    }
}

#[async_trait]
impl Queue for SqsQueue {
    async fn send(&self, body: &str) -> Result<(), QueueError> {
        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| QueueError::Backend(format!("SQS send failed: {}", DisplayErrorContext(&e))))?;
        Ok(())
    }

    async fn receive(&self, max_messages: usize) -> Result<Vec<QueueMessage>, QueueError> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(max_messages.clamp(1, 10) as i32)
            .wait_time_seconds(self.wait_time_seconds)
            .send()
            .await
            .map_err(|e| {
                QueueError::Backend(format!("SQS receive failed: {}", DisplayErrorContext(&e)))
            })?;

        let messages = output
            .messages()
            .iter()
            .filter_map(|m| {
                let receipt = m.receipt_handle()?;
                Some(QueueMessage {
                    id: m.message_id().unwrap_or_default().to_string(),
                    receipt: receipt.to_string(),
                    body: m.body().unwrap_or_default().to_string(),
                })
            })
            .collect();

        Ok(messages)
    }

    async fn ack(&self, receipt: &str) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt)
            .send()
            .await
            .map_err(|e| {
                QueueError::Backend(format!("SQS delete failed: {}", DisplayErrorContext(&e)))
            })?;
        Ok(())
    }
}
