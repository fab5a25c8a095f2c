use async_trait::async_trait;

use super::QueuePublisher;
use crate::storage::models::TextMiningMessage;
use crate::storage::Database;

/// Durable local queue kept in the service's own redb database.
/// Used for single-node deployments and development.
pub struct OutboxPublisher {
    db: Database,
}

impl OutboxPublisher {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl QueuePublisher for OutboxPublisher {
    async fn publish(&self, queue: &str, message: &TextMiningMessage, exchange: &str) -> bool {
        match self.db.append_message(queue, exchange, message) {
            Ok(sequence) => {
                tracing::debug!(
                    queue,
                    sequence,
                    ft_id = %message.ft_id,
                    filename = %message.filename,
                    "Queued message in outbox"
                );
                true
            }
            Err(e) => {
                tracing::error!(queue, ft_id = %message.ft_id, error = %e, "Failed to append message to outbox");
                false
            }
        }
    }
}
