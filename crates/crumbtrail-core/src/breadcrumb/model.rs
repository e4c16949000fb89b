//! Breadcrumb domain models.

use serde::{Deserialize, Serialize};

use crate::query;

/// One visited dashboard.
///
/// Field names on the wire match what the Grafana breadcrumb panel has
/// always written to session storage, so trails survive an upgrade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BreadcrumbEntry {
    /// Stable dashboard uid.
    #[serde(rename = "uid")]
    pub identity_key: String,
    /// `/d/{uid}`, no query string.
    #[serde(rename = "url")]
    pub path: String,
    #[serde(rename = "name")]
    pub display_name: String,
    /// Query parameters of the page at the time of the visit.
    #[serde(rename = "params", default)]
    pub query_string: String,
    /// Fully qualified link including `query_string`.
    #[serde(rename = "fullUrl")]
    pub canonical_url: String,
}

impl BreadcrumbEntry {
    /// The id segment written to the `breadcrumb` URL parameter.
    pub fn id_segment(&self) -> &str {
        query::path_segment_after_last_slash(&self.path)
    }
}

/// Ordered trail of visited dashboards, oldest first.
///
/// The list never holds two entries with the same identity key: [`push_unique`]
/// is the only way entries get appended.
///
/// [`push_unique`]: BreadcrumbList::push_unique
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct BreadcrumbList {
    entries: Vec<BreadcrumbEntry>,
}

impl BreadcrumbList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from entries, dropping later duplicates of an identity key.
    pub fn from_entries(entries: impl IntoIterator<Item = BreadcrumbEntry>) -> Self {
        let mut list = Self::new();
        for entry in entries {
            list.push_unique(entry);
        }
        list
    }

    pub fn entries(&self) -> &[BreadcrumbEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&BreadcrumbEntry> {
        self.entries.last()
    }

    pub fn get(&self, index: usize) -> Option<&BreadcrumbEntry> {
        self.entries.get(index)
    }

    pub fn contains_key(&self, identity_key: &str) -> bool {
        self.entries.iter().any(|e| e.identity_key == identity_key)
    }

    /// Appends `entry` unless its identity key is already present.
    ///
    /// Returns `true` when the entry was appended.
    pub fn push_unique(&mut self, entry: BreadcrumbEntry) -> bool {
        if self.contains_key(&entry.identity_key) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Evicts the oldest entries until at most `max` remain.
    ///
    /// Returns the number of evicted entries.
    pub fn trim_to(&mut self, max: usize) -> usize {
        let excess = self.entries.len().saturating_sub(max);
        self.entries.drain(..excess);
        excess
    }

    /// Keeps entries `0..=index`. Returns `false` when nothing was removed.
    pub fn truncate_after(&mut self, index: usize) -> bool {
        if index + 1 >= self.entries.len() {
            return false;
        }
        self.entries.truncate(index + 1);
        true
    }

    pub fn pop(&mut self) -> Option<BreadcrumbEntry> {
        self.entries.pop()
    }

    /// Comma-joined id segments, as carried by the `breadcrumb` URL parameter.
    pub fn to_id_list(&self) -> String {
        query::encode_id_list(self.entries.iter().map(|e| e.path.as_str()))
    }
}

impl<'a> IntoIterator for &'a BreadcrumbList {
    type Item = &'a BreadcrumbEntry;
    type IntoIter = std::slice::Iter<'a, BreadcrumbEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(uid: &str) -> BreadcrumbEntry {
        BreadcrumbEntry {
            identity_key: uid.to_string(),
            path: format!("/d/{}", uid),
            display_name: uid.to_uppercase(),
            query_string: "?orgId=1".to_string(),
            canonical_url: format!("http://localhost/d/{}?orgId=1", uid),
        }
    }

    #[test]
    fn test_push_unique_skips_present_key() {
        let mut list = BreadcrumbList::new();
        assert!(list.push_unique(entry("a")));
        assert!(!list.push_unique(entry("a")));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_from_entries_drops_duplicates() {
        let list = BreadcrumbList::from_entries([entry("a"), entry("b"), entry("a")]);
        let keys: Vec<&str> = list.entries().iter().map(|e| e.identity_key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_trim_to_evicts_oldest() {
        let mut list =
            BreadcrumbList::from_entries([entry("a"), entry("b"), entry("c"), entry("d")]);
        assert_eq!(list.trim_to(2), 2);
        assert_eq!(list.to_id_list(), "c,d");
        assert_eq!(list.trim_to(5), 0);
    }

    #[test]
    fn test_truncate_after() {
        let mut list = BreadcrumbList::from_entries([entry("a"), entry("b"), entry("c")]);
        assert!(!list.truncate_after(2));
        assert!(list.truncate_after(1));
        assert_eq!(list.to_id_list(), "a,b");
    }

    #[test]
    fn test_wire_format_uses_panel_field_names() {
        let list = BreadcrumbList::from_entries([entry("abc")]);
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "uid": "abc",
                "url": "/d/abc",
                "name": "ABC",
                "params": "?orgId=1",
                "fullUrl": "http://localhost/d/abc?orgId=1"
            }])
        );
    }
}
