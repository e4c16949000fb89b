//! HttpCatalogService - REST implementation of the dashboard catalog.
//!
//! Talks to the host's search endpoint (`GET api/search`), which lists every
//! dashboard the current user can see.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use crumbtrail_core::catalog::{CatalogRecord, CatalogService, StaticCatalogService};
use crumbtrail_core::config::CatalogConfig;
use crumbtrail_core::error::{CrumbError, Result};
use reqwest::Client;

/// Catalog fetched over HTTP.
#[derive(Clone)]
pub struct HttpCatalogService {
    client: Client,
    search_url: String,
    api_token: Option<String>,
    timeout: std::time::Duration,
}

impl HttpCatalogService {
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            client: Client::new(),
            search_url: config.search_url(),
            api_token: config.api_token.clone(),
            timeout: config.retry.timeout(),
        }
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }
}

#[async_trait]
impl CatalogService for HttpCatalogService {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogRecord>> {
        let mut request = self
            .client
            .get(&self.search_url)
            .header("Accept", "application/json")
            .timeout(self.timeout);

        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        tracing::debug!(url = %self.search_url, "fetching dashboard catalog");

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CrumbError::catalog_fetch(format!(
                "catalog request failed with status {}: {}",
                status, body
            )));
        }

        let records: Vec<CatalogRecord> = response.json().await?;
        tracing::debug!(count = records.len(), "dashboard catalog fetched");
        Ok(records)
    }
}

/// Loads a catalog snapshot saved as a JSON array of `{url, title, uid}`.
pub fn load_catalog_file(path: impl AsRef<Path>) -> Result<StaticCatalogService> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| CrumbError::catalog_fetch(format!("{}: {}", path.display(), e)))?;
    let records: Vec<CatalogRecord> = serde_json::from_str(&content)?;
    Ok(StaticCatalogService::new(records))
}
