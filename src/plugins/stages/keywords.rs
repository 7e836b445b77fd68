use scraper::{Html, Node};

use crate::models::StockStatus;
use crate::plugins::traits::{ExtractionStage, Page, StageResult};

pub const IN_STOCK_PHRASES: &[&str] = &[
    "op voorraad",
    "op=voorraad",
    "online op voorraad",
    "direct leverbaar",
    "morgen in huis",
    "in stock",
    "available",
];

pub const OUT_OF_STOCK_PHRASES: &[&str] = &[
    "niet op voorraad",
    "uitverkocht",
    "tijdelijk uitverkocht",
    "niet beschikbaar",
    "niet leverbaar",
    "currently unavailable",
    "out of stock",
];

pub const PRE_ORDER_PHRASES: &[&str] = &["pre-order", "preorder", "pre-orderen", "verwacht"];

const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Scans the visible page text for stock phrases.
///
/// Phrase sets are checked in a fixed priority: in-stock, then out-of-stock,
/// then pre-order. The first set with any match decides the status. Matching is
/// by substring, so "niet op voorraad" and "currently unavailable" also hit the
/// in-stock set.
pub struct KeywordStage {
    phrase_sets: Vec<(StockStatus, Vec<String>)>,
}

impl KeywordStage {
    pub fn new() -> Self {
        Self::with_phrases(IN_STOCK_PHRASES, OUT_OF_STOCK_PHRASES, PRE_ORDER_PHRASES)
    }

    pub fn with_phrases(in_stock: &[&str], out_of_stock: &[&str], pre_order: &[&str]) -> Self {
        Self {
            phrase_sets: vec![
                (StockStatus::InStock, lowercase_all(in_stock)),
                (StockStatus::OutOfStock, lowercase_all(out_of_stock)),
                (StockStatus::PreOrder, lowercase_all(pre_order)),
            ],
        }
    }

    pub fn classify(&self, text: &str) -> Option<StockStatus> {
        self.phrase_sets
            .iter()
            .find(|(_, phrases)| phrases.iter().any(|p| text.contains(p.as_str())))
            .map(|(status, _)| *status)
    }
}

impl Default for KeywordStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionStage for KeywordStage {
    fn name(&self) -> &str {
        "keywords"
    }

    fn evaluate(&self, page: &Page) -> StageResult {
        let text = visible_text(&page.document);
        match self.classify(&text) {
            Some(status) => StageResult::conclusive(status, None),
            None => StageResult::inconclusive(None),
        }
    }
}

fn lowercase_all(phrases: &[&str]) -> Vec<String> {
    phrases.iter().map(|p| p.to_lowercase()).collect()
}

/// Lowercased text content outside of script-like elements, whitespace collapsed.
pub fn visible_text(document: &Html) -> String {
    let mut words = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node
            .ancestors()
            .filter_map(|a| a.value().as_element())
            .any(|e| HIDDEN_ELEMENTS.contains(&e.name()));
        if hidden {
            continue;
        }

        words.extend(text.split_whitespace().map(str::to_lowercase));
    }

    words.join(" ")
}
