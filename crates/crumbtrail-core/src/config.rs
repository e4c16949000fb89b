//! Configuration model.
//!
//! Loaded from TOML by `crumbtrail-infrastructure`; every section and
//! field is optional and falls back to the defaults below.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::options::PanelOptions;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CrumbtrailConfig {
    #[serde(default)]
    pub panel: PanelOptions,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub reconciler: ReconcilerSettings,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Where the catalog lives and how hard to try reaching it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_search_path")]
    pub search_path: String,
    /// Bearer token sent with catalog requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(flatten)]
    pub retry: RetryPolicy,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_search_path() -> String {
    "api/search".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            search_path: default_search_path(),
            api_token: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl CatalogConfig {
    /// Full URL of the search endpoint.
    pub fn search_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.search_path.trim_start_matches('/')
        )
    }
}

/// Timeout and exponential backoff for catalog fetches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryPolicy {
    /// Per-attempt timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Total attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_timeout_ms() -> u64 {
    5_000
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    200
}

const fn default_max_backoff_ms() -> u64 {
    2_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryPolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Attempts to make; never less than one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay before retry number `attempt` (1-based), doubling each time up to the cap.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let delay = self.initial_backoff_ms.saturating_mul(1u64 << exponent);
        Duration::from_millis(delay.min(self.max_backoff_ms))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReconcilerSettings {
    /// Write the trail including the current page to the `breadcrumb` URL
    /// parameter. Off by default: the parameter carries the trail as it was
    /// before the current page was appended.
    #[serde(default)]
    pub encode_current_page_in_url: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// File backing the session store. Defaults to the user's data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_file: Option<PathBuf>,
}
