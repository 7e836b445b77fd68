use regex::Regex;
use scraper::Selector;
use serde_json::Value;
use std::sync::LazyLock;

use crate::models::StockStatus;
use crate::plugins::traits::{ExtractionStage, Page, StageResult};

static LD_JSON: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("valid ld+json selector")
});

// Tolerates blocks that are not strictly valid JSON
static AVAILABILITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bavailability\b"?\s*:\s*"([^"]*)""#).expect("valid availability regex")
});
static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""name"\s*:\s*"([^"]*)""#).expect("valid name regex"));

/// Reads `availability` and `name` from JSON-LD product metadata.
///
/// Each block is tried with a raw-text pattern match first, then as a parsed
/// JSON document. The first block yielding InStock, OutOfStock or PreOrder
/// wins. A block with an unrecognised token only contributes its name.
pub struct StructuredDataStage;

impl StructuredDataStage {
    pub fn new() -> Self {
        Self
    }

    /// Status and product name of one JSON-LD block. A name is only reported
    /// alongside an availability token from the same block.
    fn evaluate_block(&self, content: &str) -> (Option<StockStatus>, Option<String>) {
        let name = || {
            NAME.captures(content)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|n| !n.is_empty())
        };

        let fast = AVAILABILITY
            .captures(content)
            .and_then(|c| c.get(1))
            .and_then(|m| StockStatus::from_availability(m.as_str()));
        if let Some(status) = fast.filter(|s| *s != StockStatus::Unknown) {
            return (Some(status), name());
        }

        let offer = serde_json::from_str::<Value>(content)
            .ok()
            .and_then(|data| find_offer(&data).map(|(availability, offer_name)| {
                (StockStatus::from_availability(availability), offer_name)
            }));

        match offer {
            Some((status, offer_name)) => (status, offer_name.or_else(name)),
            None if fast.is_some() => (fast, name()),
            None => (None, None),
        }
    }
}

impl Default for StructuredDataStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionStage for StructuredDataStage {
    fn name(&self) -> &str {
        "structured-data"
    }

    fn evaluate(&self, page: &Page) -> StageResult {
        let mut fallback_name = None;

        for script in page.document.select(&LD_JSON) {
            let content = script.text().collect::<String>();
            if content.trim().is_empty() {
                continue;
            }

            let (status, name) = self.evaluate_block(&content);
            match status {
                Some(StockStatus::Unknown) | None => {
                    if fallback_name.is_none() {
                        fallback_name = name;
                    }
                }
                Some(status) => return StageResult::conclusive(status, name),
            }
        }

        StageResult::inconclusive(fallback_name)
    }
}

/// Depth-first search for an object whose `offers` (object or list of
/// objects) carries an `availability` string. Returns the availability and
/// the object's sibling `name`.
fn find_offer(value: &Value) -> Option<(&str, Option<String>)> {
    match value {
        Value::Object(map) => {
            let offer_availability = match map.get("offers") {
                Some(Value::Object(offer)) => offer.get("availability").and_then(Value::as_str),
                Some(Value::Array(offers)) => offers
                    .iter()
                    .find_map(|o| o.get("availability").and_then(Value::as_str)),
                _ => None,
            };

            if let Some(availability) = offer_availability {
                let name = map
                    .get("name")
                    .and_then(Value::as_str)
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty());
                return Some((availability, name));
            }

            map.values().find_map(find_offer)
        }
        Value::Array(values) => values.iter().find_map(find_offer),
        _ => None,
    }
}
