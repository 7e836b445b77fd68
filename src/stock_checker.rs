use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::extractor::StatusExtractor;
use crate::models::{Observation, StockStatus};
use crate::plugins::traits::{Notifier, StockChangeEvent};
use crate::scraper::PageFetcher;
use crate::store::TrackingStore;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemCheckResult {
    pub url: String,
    pub fetched: bool,
    pub previous: Option<StockStatus>,
    pub status: StockStatus,
    pub title: Option<String>,
    pub alerted: bool,
    pub notified: bool,
    pub total_time_ms: u64,
}

/// Fetch -> extract -> detect -> store -> notify for a single item.
pub struct StockChecker {
    fetcher: Arc<dyn PageFetcher>,
    extractor: StatusExtractor,
    notifier: Arc<dyn Notifier>,
}

impl StockChecker {
    pub fn new(fetcher: Arc<dyn PageFetcher>, extractor: StatusExtractor, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            fetcher,
            extractor,
            notifier,
        }
    }

    /// Fetch and classify a page without touching any stored state.
    /// A failed fetch is an `Unknown` observation with no title.
    pub async fn observe(&self, url: &str) -> (Observation, bool) {
        let (status, title, fetched) = match self.fetcher.fetch(url).await {
            Ok(body) => {
                let extraction = self.extractor.extract(&body);
                debug!(
                    url = %url,
                    status = %extraction.status,
                    stage = ?extraction.decided_by,
                    "Extracted stock status"
                );
                (extraction.status, extraction.name, true)
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Fetch failed, treating status as unknown");
                (StockStatus::Unknown, None, false)
            }
        };

        let outcome = if fetched { "ok" } else { "fetch_failed" };
        metrics::counter!("stock_checks_total", "outcome" => outcome).increment(1);

        let observation = Observation {
            status,
            title,
            checked_at: Utc::now(),
        };
        (observation, fetched)
    }

    /// Check one tracked item and alert on an alert-worthy transition.
    ///
    /// Returns `None` if the item is no longer tracked, either before the
    /// fetch or by the time the result is recorded.
    pub async fn check_item(&self, store: &TrackingStore, url: &str) -> Option<ItemCheckResult> {
        let start_time = Instant::now();

        let Some(before) = store.get(url).await else {
            debug!(url = %url, "Item removed before its turn, skipping");
            return None;
        };

        let (observation, fetched) = self.observe(url).await;
        let Some(recorded) = store.record_observation(url, &observation).await else {
            debug!(url = %url, "Item removed during check, dropping result");
            return None;
        };

        let mut notified = false;
        if let Some(transition) = recorded.transition {
            info!(
                url = %url,
                previous = %transition.previous_or_unknown(),
                current = %transition.current,
                "Stock status changed"
            );
            metrics::counter!("stock_alerts_total").increment(1);

            let event = StockChangeEvent {
                url: url.to_string(),
                title: recorded.item.display_name().to_string(),
                site: recorded.item.host(),
                previous: transition.previous_or_unknown(),
                current: transition.current,
                checked_at: observation.checked_at,
            };
            notified = self.deliver(store, &event).await;
        }

        Some(ItemCheckResult {
            url: url.to_string(),
            fetched,
            previous: before.last_status,
            status: observation.status,
            title: recorded.item.last_title.clone(),
            alerted: recorded.transition.is_some(),
            notified,
            total_time_ms: start_time.elapsed().as_millis() as u64,
        })
    }

    // At most one send per transition; failures are logged and dropped.
    async fn deliver(&self, store: &TrackingStore, event: &StockChangeEvent) -> bool {
        let Some(sink) = store.alert_sink().await else {
            debug!(url = %event.url, "No alert sink configured, skipping delivery");
            return false;
        };

        match self.notifier.notify(&sink, event).await {
            Ok(result) if result.success => true,
            Ok(result) => {
                warn!(
                    notifier = self.notifier.name(),
                    error = ?result.error,
                    "Notification was not accepted"
                );
                false
            }
            Err(e) => {
                warn!(notifier = self.notifier.name(), error = %e, "Failed to send notification");
                false
            }
        }
    }
}
