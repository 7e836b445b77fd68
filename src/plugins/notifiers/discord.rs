use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::models::StockStatus;
use crate::plugins::traits::{Notifier, NotificationResult, StockChangeEvent};
use crate::utils::error::{AppError, Result};

/// Posts change events to a Discord webhook. The alert sink is the webhook url.
pub struct DiscordNotifier {
    client: Client,
    username: String,
}

impl DiscordNotifier {
    pub fn new(username: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            username: username.into(),
        })
    }

    fn get_embed_color(&self, status: StockStatus) -> u32 {
        match status {
            StockStatus::InStock => 0x00ff00,    // Green, go buy
            StockStatus::PreOrder => 0x0099ff,   // Blue
            StockStatus::OutOfStock => 0xff3300, // Red
            StockStatus::Unknown => 0x999999,    // Grey
        }
    }

    fn get_emoji(&self, status: StockStatus) -> &str {
        match status {
            StockStatus::InStock => "✅",
            StockStatus::PreOrder => "🕒",
            StockStatus::OutOfStock => "❌",
            StockStatus::Unknown => "❔",
        }
    }

    fn create_embed(&self, event: &StockChangeEvent) -> serde_json::Value {
        json!({
            "title": format!("{} {}", self.get_emoji(event.current), event.title),
            "url": event.url,
            "color": self.get_embed_color(event.current),
            "timestamp": event.checked_at.to_rfc3339(),
            "fields": [
                {
                    "name": "Status",
                    "value": format!("`{}` → **`{}`**", event.previous, event.current),
                    "inline": true
                },
                {
                    "name": "Site",
                    "value": format!("`{}`", event.site),
                    "inline": true
                }
            ],
            "footer": { "text": self.username }
        })
    }

    fn create_webhook_payload(&self, event: &StockChangeEvent) -> serde_json::Value {
        json!({
            "username": self.username,
            "content": event.format_message(),
            "embeds": [self.create_embed(event)]
        })
    }

    fn validate_sink(sink: &str) -> Result<url::Url> {
        let url = url::Url::parse(sink)
            .map_err(|e| AppError::Notification(format!("Alert sink is not a webhook url: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::Notification(format!(
                "Unsupported webhook scheme '{}'",
                url.scheme()
            )));
        }
        Ok(url)
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &'static str {
        "discord"
    }

    async fn notify(&self, sink: &str, event: &StockChangeEvent) -> Result<NotificationResult> {
        let webhook = Self::validate_sink(sink)?;
        let payload = self.create_webhook_payload(event);

        let response = self.client.post(webhook).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Ok(NotificationResult {
                success: false,
                message_id: None,
                error: Some(format!("Webhook returned {}", status)),
            });
        }

        Ok(NotificationResult {
            success: true,
            message_id: Some(format!("discord-{}", event.checked_at.timestamp())),
            error: None,
        })
    }
}
