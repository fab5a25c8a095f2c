use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::QueuePublisher;
use crate::storage::models::TextMiningMessage;

/// Publishes through the RabbitMQ management HTTP API.
pub struct RabbitMqPublisher {
    api_url: String,
    client: Client,
    password: String,
    username: String,
    vhost: String,
}

#[derive(Deserialize)]
struct PublishResponse {
    routed: bool,
}

impl RabbitMqPublisher {
    pub fn new(
        api_url: &str,
        vhost: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            client,
            password: password.to_string(),
            username: username.to_string(),
            vhost: vhost.to_string(),
        })
    }

    fn publish_url(&self, exchange: &str) -> String {
        publish_url(&self.api_url, &self.vhost, exchange)
    }
}

/// The default exchange has no name on the wire, the HTTP API calls it `amq.default`.
fn publish_url(api_url: &str, vhost: &str, exchange: &str) -> String {
    let exchange = if exchange.is_empty() {
        "amq.default"
    } else {
        exchange
    };
    format!(
        "{}/api/exchanges/{}/{}/publish",
        api_url,
        urlencoding::encode(vhost),
        urlencoding::encode(exchange)
    )
}

#[async_trait]
impl QueuePublisher for RabbitMqPublisher {
    async fn publish(&self, queue: &str, message: &TextMiningMessage, exchange: &str) -> bool {
        let payload = match serde_json::to_string(message) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(queue, ft_id = %message.ft_id, error = %e, "Failed to encode queue message");
                return false;
            }
        };

        let body = serde_json::json!({
            "properties": {
                "content_type": "application/json",
                "delivery_mode": 2,
            },
            "routing_key": queue,
            "payload": payload,
            "payload_encoding": "string",
        });

        let resp = match self
            .client
            .post(self.publish_url(exchange))
            .basic_auth(&self.username, Some(&self.password))
            .json(&body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(queue, ft_id = %message.ft_id, error = %e, "RabbitMQ publish request failed");
                return false;
            }
        };

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(queue, ft_id = %message.ft_id, %status, body = %body, "RabbitMQ rejected publish");
            return false;
        }

        match resp.json::<PublishResponse>().await {
            Ok(PublishResponse { routed: true }) => true,
            Ok(PublishResponse { routed: false }) => {
                tracing::error!(queue, exchange, ft_id = %message.ft_id, "Message was not routed to any queue");
                false
            }
            Err(e) => {
                tracing::error!(queue, ft_id = %message.ft_id, error = %e, "Unreadable RabbitMQ publish response");
                false
            }
        }
    }
}
