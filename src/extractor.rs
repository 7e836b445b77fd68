use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::models::StockStatus;
use crate::plugins::stages::{KeywordStage, StructuredDataStage};
use crate::plugins::traits::{ExtractionStage, Page, StageOutcome};

static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid title selector"));

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Extraction {
    pub status: StockStatus,
    pub name: Option<String>,
    /// Stage that produced the status, `None` when no stage was conclusive.
    pub decided_by: Option<String>,
}

impl Extraction {
    pub fn unknown() -> Self {
        Self {
            status: StockStatus::Unknown,
            name: None,
            decided_by: None,
        }
    }
}

/// Runs the extraction stages in order and stops at the first conclusive one.
///
/// The display name is the first name any stage reported, else the page's
/// `<title>`. A page no stage can classify is `Unknown`.
pub struct StatusExtractor {
    stages: Vec<Box<dyn ExtractionStage>>,
}

impl StatusExtractor {
    pub fn new() -> Self {
        Self::with_stages(vec![
            Box::new(StructuredDataStage::new()),
            Box::new(KeywordStage::new()),
        ])
    }

    pub fn with_stages(stages: Vec<Box<dyn ExtractionStage>>) -> Self {
        Self { stages }
    }

    pub fn extract(&self, body: &str) -> Extraction {
        if body.trim().is_empty() {
            return Extraction::unknown();
        }

        let page = Page::parse(body);
        let mut name = None;

        for stage in &self.stages {
            let result = stage.evaluate(&page);
            if name.is_none() {
                name = result.name;
            }

            if let StageOutcome::Conclusive(status) = result.outcome {
                tracing::trace!(stage = stage.name(), %status, "Stage was conclusive");
                return Extraction {
                    status,
                    name: name.or_else(|| page_title(&page.document)),
                    decided_by: Some(stage.name().to_string()),
                };
            }
        }

        Extraction {
            status: StockStatus::Unknown,
            name: name.or_else(|| page_title(&page.document)),
            decided_by: None,
        }
    }
}

impl Default for StatusExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn page_title(document: &Html) -> Option<String> {
    document
        .select(&TITLE)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}
