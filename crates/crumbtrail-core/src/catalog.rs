//! Dashboard catalog: the listing service that knows every dashboard.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::breadcrumb::BreadcrumbEntry;
use crate::error::Result;
use crate::location::PageLocation;
use crate::query::{self, ORG_ID_PARAM, QueryParams};

/// A raw listing record as returned by the search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogRecord {
    pub url: String,
    pub title: String,
    pub uid: String,
}

impl CatalogRecord {
    /// Whether the record's URL path contains the segments `d/{id}`.
    ///
    /// Matching is by whole path segment, so `abc` never matches `/d/abcdef`.
    pub fn matches_id(&self, id: &str) -> bool {
        let path = self.url.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').collect();
        segments
            .windows(2)
            .any(|pair| pair[0] == "d" && pair[1] == id)
    }
}

/// Source of the dashboard catalog.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Fetches the full list of dashboards.
    async fn fetch_catalog(&self) -> Result<Vec<CatalogRecord>>;
}

/// Finds the first record whose path carries `id` as its dashboard segment.
pub fn resolve_by_id_suffix<'a>(
    id: &str,
    catalog: &'a [CatalogRecord],
) -> Option<&'a CatalogRecord> {
    catalog.iter().find(|record| record.matches_id(id))
}

/// Resolves a `breadcrumb` id list into entries, dropping unknown ids.
///
/// Entries built here only carry the `orgId` of the current location as
/// their query string; other parameters of the original visit are not
/// recoverable from the id list.
pub fn filter_and_resolve(
    ids: &[String],
    catalog: &[CatalogRecord],
    location: &PageLocation,
) -> Vec<BreadcrumbEntry> {
    let current = location.query_params();
    let mut org_params = QueryParams::new();
    if let Some(org_id) = current.get(ORG_ID_PARAM) {
        org_params.insert(ORG_ID_PARAM, Some(org_id.to_string()));
    }
    let params = if org_params.is_empty() {
        String::new()
    } else {
        query::encode(&org_params)
    };
    let root = location.dashboard_root();

    ids.iter()
        .filter_map(|id| match resolve_by_id_suffix(id, catalog) {
            Some(record) => Some(record),
            None => {
                tracing::debug!(id = %id, "breadcrumb id not found in catalog, dropping");
                None
            }
        })
        .map(|record| BreadcrumbEntry {
            identity_key: record.uid.clone(),
            path: format!("/d/{}", record.uid),
            display_name: record.title.clone(),
            query_string: params.clone(),
            canonical_url: format!("{}/d/{}{}", root, record.uid, params),
        })
        .collect()
}

/// Catalog backed by a fixed set of records.
///
/// Counts fetches so callers can observe how often the catalog was hit.
#[derive(Debug, Default)]
pub struct StaticCatalogService {
    records: Vec<CatalogRecord>,
    fetches: AtomicUsize,
}

impl StaticCatalogService {
    pub fn new(records: Vec<CatalogRecord>) -> Self {
        Self {
            records,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Number of completed `fetch_catalog` calls.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogService for StaticCatalogService {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.clone())
    }
}
