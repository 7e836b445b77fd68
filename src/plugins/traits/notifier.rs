use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::models::StockStatus;
use crate::utils::error::Result;

/// A detected stock transition, ready for delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockChangeEvent {
    pub url: String,
    /// Resolved display name, or the url when no title is known.
    pub title: String,
    pub site: String,
    pub previous: StockStatus,
    pub current: StockStatus,
    pub checked_at: DateTime<Utc>,
}

impl StockChangeEvent {
    pub fn format_message(&self) -> String {
        format!(
            "**Stock change detected**\n**{}**\nSite: `{}`\nStatus: `{}` → **`{}`**\nLink: {}\nAt: {}",
            self.title,
            self.site,
            self.previous,
            self.current,
            self.url,
            self.checked_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

/// Delivers change events to an operator-chosen destination.
///
/// Delivery is best effort. Callers log and drop errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn notify(&self, sink: &str, event: &StockChangeEvent) -> Result<NotificationResult>;
}
