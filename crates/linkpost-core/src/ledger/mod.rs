mod store;

pub use store::LedgerStore;

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Record of every link handed to the automation runner, plus the most recent one.
///
/// The serialized field names match the `processed_links.json` files written by
/// earlier deployments, so an existing ledger keeps deduping after an upgrade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    #[serde(default)]
    processed_links: BTreeSet<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    last_processed_link: Option<String>,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a link has already been handled
    pub fn contains(&self, link: &str) -> bool {
        self.processed_links.contains(link)
    }

    /// Mark a link as handled and make it the last-submitted link
    pub fn record(&mut self, link: &str) {
        self.processed_links.insert(link.to_string());
        self.last_processed_link = Some(link.to_string());
    }

    /// Drop a link so the next poll that sees it submits it again.
    ///
    /// Returns `true` if the link was present.
    pub fn forget(&mut self, link: &str) -> bool {
        let removed = self.processed_links.remove(link);
        if self.last_processed_link.as_deref() == Some(link) {
            self.last_processed_link = None;
        }
        removed
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.processed_links.clear();
        self.last_processed_link = None;
    }

    /// The most recently recorded link, if any
    pub fn last(&self) -> Option<&str> {
        self.last_processed_link.as_deref()
    }

    pub fn len(&self) -> usize {
        self.processed_links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed_links.is_empty()
    }

    /// Iterate recorded links in lexical order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.processed_links.iter().map(String::as_str)
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|link| !link.is_empty()))
}
