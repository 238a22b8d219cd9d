//! Webhook notification sink
//!
//! Delivers one payload per call as a JSON POST to the configured webhook
//! endpoint.

use crate::notify::{NotificationSink, NotifyError};
use async_trait::async_trait;
use reqwest::Client;

/// Discord-compatible webhook sink
pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn deliver(&self, payload: &serde_json::Value) -> Result<(), NotifyError> {
        let response = self.client.post(&self.url).json(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status {
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}
