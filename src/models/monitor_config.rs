use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::models::TrackedItem;

pub const DEFAULT_INTERVAL_SECS: u64 = 5 * 60;
pub const MIN_INTERVAL_SECS: u64 = 60;

/// The full persisted monitor state: settings plus every tracked item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonitorConfig {
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    #[serde(default)]
    pub alert_sink_ref: Option<String>,
    #[serde(default)]
    pub items: ItemMap,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_seconds: DEFAULT_INTERVAL_SECS,
            alert_sink_ref: None,
            items: ItemMap::default(),
        }
    }
}

impl MonitorConfig {
    /// Interval used for scheduling, never below `floor_secs`.
    pub fn effective_interval(&self, floor_secs: u64) -> u64 {
        self.interval_seconds.max(floor_secs)
    }

    /// Resolve an identifier to the tracked url: exact url first, then nickname.
    pub fn resolve(&self, identifier: &str) -> Option<String> {
        if self.items.contains_key(identifier) {
            return Some(identifier.to_string());
        }
        self.items
            .values()
            .find(|item| item.has_nickname(identifier))
            .map(|item| item.url.clone())
    }
}

/// Tracked items keyed by url, kept in insertion order.
///
/// Persisted as a JSON object (`url -> item`); entries are read back in
/// document order so listing and sweep order survive a restart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemMap {
    entries: Vec<TrackedItem>,
}

impl ItemMap {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, url: &str) -> bool {
        self.position(url).is_some()
    }

    pub fn get(&self, url: &str) -> Option<&TrackedItem> {
        self.entries.iter().find(|item| item.url == url)
    }

    pub fn get_mut(&mut self, url: &str) -> Option<&mut TrackedItem> {
        self.entries.iter_mut().find(|item| item.url == url)
    }

    /// Insert keyed by `item.url`. An existing entry is replaced in place.
    pub fn insert(&mut self, item: TrackedItem) -> Option<TrackedItem> {
        match self.position(&item.url) {
            Some(index) => Some(std::mem::replace(&mut self.entries[index], item)),
            None => {
                self.entries.push(item);
                None
            }
        }
    }

    /// Remove an entry, keeping the relative order of the rest.
    pub fn remove(&mut self, url: &str) -> Option<TrackedItem> {
        let index = self.position(url)?;
        Some(self.entries.remove(index))
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.iter().map(|item| &item.url)
    }

    pub fn values(&self) -> impl Iterator<Item = &TrackedItem> {
        self.entries.iter()
    }

    fn position(&self, url: &str) -> Option<usize> {
        self.entries.iter().position(|item| item.url == url)
    }
}

impl Serialize for ItemMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|item| (&item.url, item)))
    }
}

impl<'de> Deserialize<'de> for ItemMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ItemMapVisitor;

        impl<'de> Visitor<'de> for ItemMapVisitor {
            type Value = ItemMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of url to tracked item")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ItemMap, A::Error> {
                let mut items = ItemMap::default();
                while let Some((url, mut item)) = access.next_entry::<String, TrackedItem>()? {
                    // the key is authoritative
                    item.url = url;
                    items.insert(item);
                }
                Ok(items)
            }
        }

        deserializer.deserialize_map(ItemMapVisitor)
    }
}
