use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;

use super::{ChannelId, ChannelSink, Notice};

/// Delivers notices as embed payloads to per-channel webhook URLs.
pub struct WebhookSink {
    urls: HashMap<ChannelId, String>,
    client: reqwest::Client,
}

impl WebhookSink {
    pub fn new(urls: HashMap<ChannelId, String>) -> Self {
        Self {
            urls,
            client: reqwest::Client::new(),
        }
    }

    fn format_message(notice: &Notice) -> serde_json::Value {
        json!({
            "embeds": [
                {
                    "title": notice.title,
                    "description": notice.body,
                    "timestamp": notice.timestamp.to_rfc3339(),
                }
            ]
        })
    }
}

#[async_trait]
impl ChannelSink for WebhookSink {
    async fn deliver(&self, channel: ChannelId, notice: Notice) -> Result<()> {
        let url = self
            .urls
            .get(&channel)
            .with_context(|| format!("no webhook configured for channel {}", channel))?;

        self.client
            .post(url)
            .json(&Self::format_message(&notice))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
