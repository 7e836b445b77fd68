use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::time::Instant;

use crate::config::MonitorSettings;
use crate::stock_checker::StockChecker;
use crate::store::TrackingStore;

/// Pacing knobs for the sweep loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepTiming {
    pub item_jitter_min_ms: u64,
    pub item_jitter_max_ms: u64,
    pub sweep_jitter_max_secs: u64,
    pub startup_grace_secs: u64,
}

impl From<&MonitorSettings> for SweepTiming {
    fn from(settings: &MonitorSettings) -> Self {
        Self {
            item_jitter_min_ms: settings.item_jitter_min_ms,
            item_jitter_max_ms: settings.item_jitter_max_ms.max(settings.item_jitter_min_ms),
            sweep_jitter_max_secs: settings.sweep_jitter_max_secs,
            startup_grace_secs: settings.startup_grace_secs,
        }
    }
}

impl Default for SweepTiming {
    fn default() -> Self {
        Self::from(&MonitorSettings::default())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SweepSummary {
    pub checked: usize,
    pub skipped: usize,
    pub alerts: usize,
    pub notified: usize,
    pub interrupted: bool,
    pub duration_ms: u64,
}

/// Sequential sweep loop over every tracked item.
///
/// Items are checked one at a time with a randomized pause between them.
/// Sweeps repeat every `interval` seconds plus a random extra, read fresh
/// from the store each round so setting changes apply to the next sleep.
pub struct SweepScheduler {
    store: Arc<TrackingStore>,
    checker: Arc<StockChecker>,
    timing: SweepTiming,
}

impl SweepScheduler {
    pub fn new(store: Arc<TrackingStore>, checker: Arc<StockChecker>, timing: SweepTiming) -> Self {
        Self {
            store,
            checker,
            timing,
        }
    }

    /// Run until `shutdown` flips. No sweep starts before `ready` fires.
    pub async fn run(&self, ready: oneshot::Receiver<()>, mut shutdown: watch::Receiver<bool>) {
        tokio::select! {
            res = ready => {
                if res.is_err() {
                    tracing::warn!("Control plane never became ready, scheduler not started");
                    return;
                }
            }
            _ = shutdown.changed() => {
                tracing::info!("Shutdown requested before scheduler start");
                return;
            }
        }

        tracing::info!(grace_secs = self.timing.startup_grace_secs, "Stock scheduler started");
        if sleep_or_shutdown(Duration::from_secs(self.timing.startup_grace_secs), &mut shutdown).await {
            tracing::info!("Stock scheduler stopped");
            return;
        }

        loop {
            let summary = self.run_sweep(&mut shutdown).await;
            if summary.interrupted {
                break;
            }
            tracing::info!(
                checked = summary.checked,
                skipped = summary.skipped,
                alerts = summary.alerts,
                duration_ms = summary.duration_ms,
                "Sweep completed"
            );

            let delay = self.next_sweep_delay().await;
            tracing::debug!(delay_secs = delay.as_secs(), "Sleeping until next sweep");
            if sleep_or_shutdown(delay, &mut shutdown).await {
                break;
            }
        }

        tracing::info!("Stock scheduler stopped");
    }

    /// Check every url tracked at sweep start, in listing order.
    pub async fn run_sweep(&self, shutdown: &mut watch::Receiver<bool>) -> SweepSummary {
        let start_time = Instant::now();
        let urls = self.store.tracked_urls().await;
        let mut summary = SweepSummary::default();

        tracing::debug!(items = urls.len(), "Starting sweep");

        for (index, url) in urls.iter().enumerate() {
            if *shutdown.borrow() {
                summary.interrupted = true;
                break;
            }

            let checked = match self.checker.check_item(&self.store, url).await {
                Some(result) => {
                    summary.checked += 1;
                    if result.alerted {
                        summary.alerts += 1;
                    }
                    if result.notified {
                        summary.notified += 1;
                    }
                    true
                }
                None => {
                    summary.skipped += 1;
                    false
                }
            };

            // Pause only after a request actually went out
            let is_last = index + 1 == urls.len();
            if checked && !is_last && sleep_or_shutdown(self.item_pause(), shutdown).await {
                summary.interrupted = true;
                break;
            }
        }

        summary.duration_ms = start_time.elapsed().as_millis() as u64;
        summary
    }

    fn item_pause(&self) -> Duration {
        let ms = rand::rng().random_range(self.timing.item_jitter_min_ms..=self.timing.item_jitter_max_ms);
        Duration::from_millis(ms)
    }

    /// Stored interval (already floored) plus up to `sweep_jitter_max_secs`.
    pub async fn next_sweep_delay(&self) -> Duration {
        let interval = self.store.interval_secs().await;
        let jitter = rand::rng().random_range(0.0..=self.timing.sweep_jitter_max_secs as f64);
        Duration::from_secs(interval) + Duration::from_secs_f64(jitter)
    }
}

/// Sleep for `duration` unless shutdown is requested first. Returns true on shutdown.
pub async fn sleep_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return true;
    }

    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        _ = shutdown.changed() => true,
    }
}
