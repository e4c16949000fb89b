//! Query-string codec.
//!
//! Dashboard URLs carry two things we care about: the host's own query
//! parameters (`orgId`, time range, variables) and the `breadcrumb`
//! parameter listing the dashboard ids of the trail. Parsing is deliberately
//! lenient: nothing in a query string is ever rejected.

use serde::{Deserialize, Serialize};

/// Query parameter holding the comma-joined breadcrumb id list.
pub const BREADCRUMB_PARAM: &str = "breadcrumb";

/// Query parameter propagated into resolved breadcrumb entries.
pub const ORG_ID_PARAM: &str = "orgId";

/// Ordered key/value mapping of a query string.
///
/// Keys keep the position of their first occurrence; a repeated key takes
/// the later value. A pair without `=` is stored with an absent value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    pairs: Vec<(String, Option<String>)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `key`, or `None` when the key is missing or has no value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Inserts or replaces a value, keeping the key's original position.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    /// Removes `key`, returning its value if the key was present with one.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.pairs.iter().position(|(k, _)| k == key)?;
        self.pairs.remove(idx).1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Renders the parameters as a `&key=value&key=value` chain.
    ///
    /// Entries without a value, with the literal value `null`, or whose key
    /// is listed in `skip` are left out.
    pub fn to_param_chain(&self, skip: &[&str]) -> String {
        self.iter()
            .filter(|(k, _)| !skip.contains(k))
            .filter_map(|(k, v)| match v {
                Some(v) if !v.is_empty() && v != "null" => Some(format!("&{}={}", k, v)),
                _ => None,
            })
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (k, v) in iter {
            params.insert(k, Some(v.into()));
        }
        params
    }
}

/// Parses a query string into [`QueryParams`].
///
/// A single leading `?` or `&` is stripped, pairs are split on `&` and each
/// pair on its first `=`. The empty string yields one entry with an empty
/// key and no value.
pub fn decode(raw: &str) -> QueryParams {
    let trimmed = raw
        .strip_prefix('?')
        .or_else(|| raw.strip_prefix('&'))
        .unwrap_or(raw);

    let mut params = QueryParams::new();
    for pair in trimmed.split('&') {
        match pair.split_once('=') {
            Some((key, value)) => params.insert(key, Some(value.to_string())),
            None => {
                tracing::trace!(pair, "query pair without '=' kept with no value");
                params.insert(pair, None);
            }
        }
    }
    params
}

/// Renders [`QueryParams`] as a `?`-prefixed query string in insertion order.
pub fn encode(params: &QueryParams) -> String {
    let body = params
        .iter()
        .map(|(k, v)| match v {
            Some(v) => format!("{}={}", k, v),
            None => k.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("?{}", body)
}

/// Splits a comma-joined breadcrumb id list.
pub fn decode_id_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

/// Joins the trailing path segment of every path with commas.
pub fn encode_id_list<'a, I>(paths: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    paths
        .into_iter()
        .map(path_segment_after_last_slash)
        .collect::<Vec<_>>()
        .join(",")
}

/// Returns everything after the last `/`, or the whole input when there is none.
pub fn path_segment_after_last_slash(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, tail)| tail)
}
