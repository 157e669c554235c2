use std::time::Duration;

use async_trait::async_trait;
use eyre::Result;
use reqwest::Client;
use spill_common::{config::WebhookSinkConfig, infrastructure::HttpClientFactory};
use tracing::debug;

use super::{NotificationSink, SinkError};
use crate::formatter::{NotificationMessage, SinkKind};

/// Posts block-kit JSON to a chat webhook (Slack incoming webhook)
pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(config: &WebhookSinkConfig) -> Result<Self> {
        let factory = HttpClientFactory::with_timeout(Duration::from_millis(config.timeout_ms));
        Ok(Self { client: factory.create_client()?, url: config.url.clone() })
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Webhook
    }

    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(&self, message: &NotificationMessage) -> Result<(), SinkError> {
        let NotificationMessage::Webhook(payload) = message else {
            return Err(SinkError::UnsupportedMessage { sink: self.name(), got: message.kind() });
        };

        // The hook URL embeds its token, keep it out of errors and logs
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();
        // Slack answers non-2xx for revoked or malformed hooks
        response.error_for_status().map_err(reqwest::Error::without_url)?;

        debug!(%status, "Webhook accepted spill");
        Ok(())
    }
}
