//! Artwork bundles: art slot name → image URL.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The artwork known for one item.
///
/// Holds only slots that are actually set. A slot missing from the bundle
/// means "leave whatever is stored", never "clear it".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct ArtworkBundle {
    slots: BTreeMap<String, String>,
}

impl ArtworkBundle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a slot. Empty slot names or URLs are ignored.
    pub fn set(&mut self, slot: &str, url: &str) {
        let (slot, url) = (slot.trim(), url.trim());
        if slot.is_empty() || url.is_empty() {
            return;
        }
        self.slots.insert(slot.to_string(), url.to_string());
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, slot: &str, url: &str) -> Self {
        self.set(slot, url);
        self
    }

    #[must_use]
    pub fn get(&self, slot: &str) -> Option<&str> {
        self.slots.get(slot).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.slots.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl From<BTreeMap<String, String>> for ArtworkBundle {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }
}

impl From<ArtworkBundle> for BTreeMap<String, String> {
    fn from(bundle: ArtworkBundle) -> Self {
        bundle.slots
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for ArtworkBundle {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        let mut bundle = Self::new();
        for (slot, url) in iter {
            bundle.set(slot, url);
        }
        bundle
    }
}
