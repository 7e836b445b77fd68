use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{epoch_seconds, StockStatus};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackedItem {
    pub url: String,
    #[serde(default)]
    pub nickname: Option<String>,

    // `None` until the first completed check
    #[serde(default)]
    pub last_status: Option<StockStatus>,
    #[serde(default)]
    pub last_title: Option<String>,
    #[serde(default)]
    pub last_checked_at: Option<f64>,
}

/// Outcome of one fetch + extract pass over an item's page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    pub status: StockStatus,
    pub title: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl TrackedItem {
    pub fn new(url: impl Into<String>, nickname: Option<String>) -> Self {
        Self {
            url: url.into(),
            nickname,
            last_status: None,
            last_title: None,
            last_checked_at: None,
        }
    }

    pub fn is_never_observed(&self) -> bool {
        self.last_status.is_none()
    }

    /// Case-insensitive nickname comparison.
    pub fn has_nickname(&self, nickname: &str) -> bool {
        self.nickname
            .as_deref()
            .is_some_and(|n| n.to_lowercase() == nickname.to_lowercase())
    }

    /// Record a completed check. A missing title keeps the last known one.
    pub fn apply(&mut self, observation: &Observation) {
        self.last_status = Some(observation.status);
        if observation.title.is_some() {
            self.last_title = observation.title.clone();
        }
        self.last_checked_at = Some(epoch_seconds(observation.checked_at));
    }

    /// Title for display, falling back to the url.
    pub fn display_name(&self) -> &str {
        self.last_title.as_deref().unwrap_or(&self.url)
    }

    pub fn host(&self) -> String {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default()
    }
}
