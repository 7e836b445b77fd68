use async_trait::async_trait;
use tracing::info;

use crate::plugins::traits::{Notifier, NotificationResult, StockChangeEvent};
use crate::utils::error::Result;

/// Writes change events to the log instead of an external service.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn notify(&self, sink: &str, event: &StockChangeEvent) -> Result<NotificationResult> {
        info!(
            sink = %sink,
            url = %event.url,
            title = %event.title,
            site = %event.site,
            previous = %event.previous,
            current = %event.current,
            "Stock change detected"
        );

        Ok(NotificationResult {
            success: true,
            message_id: None,
            error: None,
        })
    }
}
