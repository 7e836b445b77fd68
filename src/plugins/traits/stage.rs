use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::models::StockStatus;

/// A fetched page body, parsed once and shared by every extraction stage.
pub struct Page {
    pub document: Html,
}

impl Page {
    pub fn parse(body: &str) -> Self {
        Self {
            document: Html::parse_document(body),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage determined a definite status; later stages are skipped.
    Conclusive(StockStatus),
    Inconclusive,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageResult {
    pub outcome: StageOutcome,
    pub name: Option<String>,
}

impl StageResult {
    pub fn conclusive(status: StockStatus, name: Option<String>) -> Self {
        Self {
            outcome: StageOutcome::Conclusive(status),
            name,
        }
    }

    pub fn inconclusive(name: Option<String>) -> Self {
        Self {
            outcome: StageOutcome::Inconclusive,
            name,
        }
    }

    pub fn status(&self) -> Option<StockStatus> {
        match self.outcome {
            StageOutcome::Conclusive(status) => Some(status),
            StageOutcome::Inconclusive => None,
        }
    }
}

/// One link in the status extraction chain.
pub trait ExtractionStage: Send + Sync {
    fn name(&self) -> &str;
    fn evaluate(&self, page: &Page) -> StageResult;
}
