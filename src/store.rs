use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::change_detector::{decide, Transition};
use crate::models::{MonitorConfig, Observation, TrackedItem};
use crate::utils::error::{AppError, Result};

/// Result of recording one completed check against the store.
#[derive(Debug, Clone)]
pub struct RecordedCheck {
    pub item: TrackedItem,
    pub transition: Option<Transition>,
}

/// Durable url -> item mapping plus global settings.
///
/// All access goes through one async mutex, so every read-modify-write
/// (including the save that follows it) happens one at a time.
pub struct TrackingStore {
    path: PathBuf,
    state: Mutex<MonitorConfig>,
    allowed_hosts: Vec<String>,
    min_interval_secs: u64,
}

impl TrackingStore {
    pub fn new(
        path: impl Into<PathBuf>,
        config: MonitorConfig,
        allowed_hosts: Vec<String>,
        min_interval_secs: u64,
    ) -> Self {
        let mut config = config;
        config.interval_seconds = config.interval_seconds.max(min_interval_secs);
        Self {
            path: path.into(),
            state: Mutex::new(config),
            allowed_hosts: allowed_hosts
                .into_iter()
                .map(|h| h.trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
            min_interval_secs,
        }
    }

    /// Open the store at `path`, falling back to an empty default configuration.
    pub async fn open(path: impl Into<PathBuf>, allowed_hosts: Vec<String>, min_interval_secs: u64) -> Self {
        let path = path.into();
        let config = Self::load(&path).await;
        Self::new(path, config, allowed_hosts, min_interval_secs)
    }

    /// Read a persisted configuration. Never fails: a missing, unreadable or
    /// malformed file yields `MonitorConfig::default()`.
    pub async fn load(path: &Path) -> MonitorConfig {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No state file yet, starting empty");
                return MonitorConfig::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read state file, starting empty");
                return MonitorConfig::default();
            }
        };

        match serde_json::from_str::<MonitorConfig>(&contents) {
            Ok(config) => {
                info!(path = %path.display(), items = config.items.len(), "Loaded tracking state");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "State file is malformed, starting empty");
                MonitorConfig::default()
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the current configuration.
    pub async fn save(&self) -> Result<()> {
        let state = self.state.lock().await;
        write_atomic(&self.path, &state).await
    }

    // Save failures are observable but never fatal; memory stays authoritative.
    async fn persist(&self, state: &MonitorConfig) {
        if let Err(e) = write_atomic(&self.path, state).await {
            metrics::counter!("state_save_failures_total").increment(1);
            warn!(path = %self.path.display(), error = %e, "Failed to save tracking state");
        }
    }

    pub async fn snapshot(&self) -> MonitorConfig {
        self.state.lock().await.clone()
    }

    /// Urls tracked right now, in listing order.
    pub async fn tracked_urls(&self) -> Vec<String> {
        self.state.lock().await.items.keys().cloned().collect()
    }

    pub async fn get(&self, url: &str) -> Option<TrackedItem> {
        self.state.lock().await.items.get(url).cloned()
    }

    pub async fn list_items(&self) -> Vec<TrackedItem> {
        self.state.lock().await.items.values().cloned().collect()
    }

    pub async fn interval_secs(&self) -> u64 {
        self.state
            .lock()
            .await
            .effective_interval(self.min_interval_secs)
    }

    pub async fn alert_sink(&self) -> Option<String> {
        self.state.lock().await.alert_sink_ref.clone()
    }

    pub fn is_allowed_url(&self, url: &str) -> bool {
        let Ok(parsed) = url::Url::parse(url) else {
            return false;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return false;
        }
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_lowercase();
        self.allowed_hosts.iter().any(|allowed| host.contains(allowed.as_str()))
    }

    pub async fn add_item(&self, url: &str, nickname: Option<String>) -> Result<TrackedItem> {
        let url = url.trim();
        if !self.is_allowed_url(url) {
            return Err(AppError::Validation(format!(
                "Please provide a product url from one of: {}",
                self.allowed_hosts.join(", ")
            )));
        }

        let mut state = self.state.lock().await;
        if state.items.contains_key(url) {
            return Err(AppError::Conflict(format!("{} is already being tracked", url)));
        }

        let nickname = nickname.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let item = TrackedItem::new(url, nickname);
        state.items.insert(item.clone());
        self.persist(&state).await;

        info!(url = %url, nickname = ?item.nickname, "Started tracking");
        Ok(item)
    }

    /// Remove by exact url first, then by case-insensitive nickname.
    pub async fn remove_item(&self, identifier: &str) -> Result<TrackedItem> {
        let mut state = self.state.lock().await;
        let url = state.resolve(identifier.trim()).ok_or_else(|| AppError::NotFound {
            resource: identifier.to_string(),
        })?;

        let removed = state.items.remove(&url).ok_or_else(|| AppError::NotFound {
            resource: identifier.to_string(),
        })?;
        self.persist(&state).await;

        info!(url = %removed.url, "Stopped tracking");
        Ok(removed)
    }

    /// Set the sweep interval in minutes, clamped to at least one minute
    /// and the configured floor. Returns the stored interval in seconds.
    pub async fn set_interval(&self, minutes: i64) -> Result<u64> {
        let minutes = minutes.max(1) as u64;
        let seconds = minutes.saturating_mul(60).max(self.min_interval_secs);

        let mut state = self.state.lock().await;
        state.interval_seconds = seconds;
        self.persist(&state).await;

        info!(interval_secs = seconds, "Updated check interval");
        Ok(seconds)
    }

    pub async fn set_alert_sink(&self, sink: Option<String>) -> Result<()> {
        let sink = sink.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let mut state = self.state.lock().await;
        state.alert_sink_ref = sink;
        self.persist(&state).await;

        info!(configured = state.alert_sink_ref.is_some(), "Updated alert sink");
        Ok(())
    }

    /// Apply a startup default sink unless one is already persisted.
    pub async fn apply_default_alert_sink(&self, sink: &str) -> bool {
        let sink = sink.trim();
        let mut state = self.state.lock().await;
        if state.alert_sink_ref.is_some() || sink.is_empty() {
            return false;
        }

        state.alert_sink_ref = Some(sink.to_string());
        self.persist(&state).await;
        debug!("Applied default alert sink from environment");
        true
    }

    /// Store a completed check and decide whether it is alert-worthy.
    ///
    /// Returns `None` when the item was removed before its check finished.
    pub async fn record_observation(&self, url: &str, observation: &Observation) -> Option<RecordedCheck> {
        let mut state = self.state.lock().await;
        let item = state.items.get_mut(url)?;

        let transition = decide(item.last_status, observation.status);
        item.apply(observation);
        let item = item.clone();
        self.persist(&state).await;

        Some(RecordedCheck { item, transition })
    }
}

async fn write_atomic(path: &Path, config: &MonitorConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let written: std::io::Result<()> = async {
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;
        tokio::fs::rename(&tmp, path).await
    }
    .await;

    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}
