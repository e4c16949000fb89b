//! Panel options exposed to the dashboard editor.

use serde::{Deserialize, Serialize};

/// Default for `breadcrumb_items_max_amount`.
pub const DEFAULT_MAX_ITEMS: i64 = 25;

/// Host-configured panel options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PanelOptions {
    /// Loading a root dashboard starts a fresh trail.
    #[serde(default, alias = "is_root_dashboard")]
    pub is_root_dashboard: bool,

    /// Suppresses rendering entirely.
    #[serde(default, alias = "hide_text_in_root_dashboard")]
    pub hide_text_in_root_dashboard: bool,

    /// Trail length limit. Anything that does not read as a positive
    /// integer means "no limit".
    #[serde(default = "default_item_limit", alias = "breadcrumb_items_max_amount")]
    pub breadcrumb_items_max_amount: Option<ItemLimit>,
}

fn default_item_limit() -> Option<ItemLimit> {
    Some(ItemLimit::Integer(DEFAULT_MAX_ITEMS))
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            is_root_dashboard: false,
            hide_text_in_root_dashboard: false,
            breadcrumb_items_max_amount: default_item_limit(),
        }
    }
}

impl PanelOptions {
    /// The effective limit on trail length, if any.
    pub fn max_items(&self) -> Option<usize> {
        self.breadcrumb_items_max_amount
            .as_ref()
            .and_then(ItemLimit::as_positive)
    }
}

/// Raw limit value as the host stores it: number or free text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ItemLimit {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ItemLimit {
    pub fn from_number(n: &serde_json::Number) -> Option<Self> {
        n.as_i64()
            .map(Self::Integer)
            .or_else(|| n.as_f64().map(Self::Float))
    }

    /// Integer reading of the value, following `parseInt(value, 10)`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            Self::Float(_) => None,
            Self::Text(s) => parse_int_prefix(s),
        }
    }

    /// The value as a usable limit: a positive integer, else `None`.
    pub fn as_positive(&self) -> Option<usize> {
        match self.as_integer() {
            Some(n) if n > 0 => usize::try_from(n).ok(),
            other => {
                tracing::debug!(limit = ?self, parsed = ?other, "breadcrumb item limit ignored");
                None
            }
        }
    }
}

/// Parses the leading integer of `raw` the way `parseInt(raw, 10)` does:
/// leading whitespace and one sign are accepted, parsing stops at the first
/// non-digit, and no digits at all is `None`.
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}
