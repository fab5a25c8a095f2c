mod outbox;
mod rabbitmq;

pub use outbox::OutboxPublisher;
pub use rabbitmq::RabbitMqPublisher;

use async_trait::async_trait;

use crate::storage::models::TextMiningMessage;

/// Publish-only side of the message queue feeding the text-mining worker.
///
/// Delivery problems are not errors: implementations log them and return
/// `false`, leaving the caller to decide what to do next.
#[async_trait]
pub trait QueuePublisher: Send + Sync {
    async fn publish(&self, queue: &str, message: &TextMiningMessage, exchange: &str) -> bool;
}
