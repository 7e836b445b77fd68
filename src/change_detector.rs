use serde::{Deserialize, Serialize};

use crate::models::StockStatus;

/// An alert-worthy transition. `previous` is `None` for a first observation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transition {
    pub previous: Option<StockStatus>,
    pub current: StockStatus,
}

impl Transition {
    /// Previous status as reported to operators.
    pub fn previous_or_unknown(&self) -> StockStatus {
        self.previous.unwrap_or(StockStatus::Unknown)
    }
}

/// Decide whether a newly observed status should raise an alert.
///
/// A first observation alerts only when the item is in stock. After that,
/// every change alerts, including a change into `Unknown`.
pub fn decide(previous: Option<StockStatus>, current: StockStatus) -> Option<Transition> {
    match previous {
        None if current == StockStatus::InStock => Some(Transition {
            previous: None,
            current,
        }),
        None => None,
        Some(prev) if prev != current => Some(Transition {
            previous: Some(prev),
            current,
        }),
        Some(_) => None,
    }
}
