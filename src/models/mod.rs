use serde::{Deserialize, Serialize};
use std::fmt;

pub mod monitor_config;
pub mod tracked_item;

// Re-exports for convenience
pub use monitor_config::*;
pub use tracked_item::*;

/// Normalized availability of a product page.
///
/// `Unknown` means a check completed but could not determine the status. An
/// item that has never been checked carries no status at all (`None`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StockStatus {
    InStock,
    OutOfStock,
    PreOrder,
    Unknown,
}

impl StockStatus {
    /// Normalize a raw availability token such as `https://schema.org/InStock`.
    ///
    /// Matching is case-insensitive and substring based. Empty tokens yield
    /// `None`; any other unrecognised token is `Unknown`.
    pub fn from_availability(raw: &str) -> Option<Self> {
        let token = raw.trim().to_lowercase();
        if token.is_empty() {
            return None;
        }
        if token.contains("instock") {
            Some(StockStatus::InStock)
        } else if token.contains("outofstock") {
            Some(StockStatus::OutOfStock)
        } else if token.contains("preorder") || token.contains("pre-order") {
            Some(StockStatus::PreOrder)
        } else {
            Some(StockStatus::Unknown)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "InStock",
            StockStatus::OutOfStock => "OutOfStock",
            StockStatus::PreOrder => "PreOrder",
            StockStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seconds since the Unix epoch with sub-second precision.
pub fn epoch_seconds(at: chrono::DateTime<chrono::Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}
