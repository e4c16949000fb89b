//! Directory resolver: dashboard ids to breadcrumb entries.
//!
//! Owns the catalog cache. The cache lock is held for the whole fetch, so
//! concurrent callers of [`DirectoryResolver::ensure_catalog_loaded`] share
//! a single request.

use std::sync::Arc;

use crumbtrail_core::breadcrumb::BreadcrumbEntry;
use crumbtrail_core::catalog::{self, CatalogRecord, CatalogService};
use crumbtrail_core::config::RetryPolicy;
use crumbtrail_core::error::{CrumbError, Result};
use crumbtrail_core::location::PageLocation;
use tokio::sync::Mutex;

/// Catalog snapshot shared between the resolver and its callers.
pub type Catalog = Arc<Vec<CatalogRecord>>;

pub struct DirectoryResolver {
    service: Arc<dyn CatalogService>,
    policy: RetryPolicy,
    cache: Mutex<Option<Catalog>>,
}

impl DirectoryResolver {
    pub fn new(service: Arc<dyn CatalogService>, policy: RetryPolicy) -> Self {
        Self {
            service,
            policy,
            cache: Mutex::new(None),
        }
    }

    /// Returns the cached catalog, fetching it first if the cache is empty.
    pub async fn ensure_catalog_loaded(&self) -> Result<Catalog> {
        let mut cache = self.cache.lock().await;
        if let Some(catalog) = cache.as_ref() {
            return Ok(catalog.clone());
        }
        let catalog: Catalog = Arc::new(self.fetch_with_retry().await?);
        *cache = Some(catalog.clone());
        Ok(catalog)
    }

    /// Fetches the catalog unconditionally and replaces the cache.
    ///
    /// On failure the previous cache, if any, is left in place.
    pub async fn refresh(&self) -> Result<Catalog> {
        let mut cache = self.cache.lock().await;
        let catalog: Catalog = Arc::new(self.fetch_with_retry().await?);
        *cache = Some(catalog.clone());
        Ok(catalog)
    }

    /// Drops the cached catalog.
    pub async fn invalidate(&self) {
        self.cache.lock().await.take();
    }

    /// The cached catalog, without fetching.
    pub async fn cached(&self) -> Option<Catalog> {
        self.cache.lock().await.clone()
    }

    /// Resolves a `breadcrumb` id list against the (possibly fetched) catalog.
    pub async fn resolve_ids(
        &self,
        ids: &[String],
        location: &PageLocation,
    ) -> Result<Vec<BreadcrumbEntry>> {
        let catalog = self.ensure_catalog_loaded().await?;
        Ok(catalog::filter_and_resolve(ids, &catalog, location))
    }

    async fn fetch_with_retry(&self) -> Result<Vec<CatalogRecord>> {
        let attempts = self.policy.attempts();
        let timeout = self.policy.timeout();
        let mut last_error = CrumbError::catalog_fetch("catalog was never requested");

        for attempt in 1..=attempts {
            match tokio::time::timeout(timeout, self.service.fetch_catalog()).await {
                Ok(Ok(records)) => {
                    tracing::debug!(attempt, count = records.len(), "catalog loaded");
                    return Ok(records);
                }
                Ok(Err(e)) => {
                    tracing::warn!(attempt, attempts, error = %e, "catalog fetch failed");
                    last_error = e;
                }
                Err(_) => {
                    tracing::warn!(
                        attempt,
                        attempts,
                        timeout_ms = self.policy.timeout_ms,
                        "catalog fetch timed out"
                    );
                    last_error = CrumbError::catalog_fetch(format!(
                        "timed out after {} ms",
                        self.policy.timeout_ms
                    ));
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.policy.delay_for_attempt(attempt)).await;
            }
        }

        Err(match last_error {
            CrumbError::CatalogFetch { message } => CrumbError::catalog_fetch(format!(
                "giving up after {} attempt(s): {}",
                attempts, message
            )),
            other => other,
        })
    }
}

impl std::fmt::Debug for DirectoryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryResolver")
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crumbtrail_core::catalog::StaticCatalogService;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn record(uid: &str, title: &str) -> CatalogRecord {
        CatalogRecord {
            url: format!("/d/{}/{}", uid, title.to_lowercase()),
            title: title.to_string(),
            uid: uid.to_string(),
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            timeout_ms: 1_000,
            max_attempts,
            initial_backoff_ms: 10,
            max_backoff_ms: 40,
        }
    }

    /// Fails the first `failures` calls, then serves one record.
    struct FlakyCatalog {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl CatalogService for FlakyCatalog {
        async fn fetch_catalog(&self) -> Result<Vec<CatalogRecord>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(CrumbError::catalog_fetch("503 Service Unavailable"))
            } else {
                Ok(vec![record("abc", "Overview")])
            }
        }
    }

    struct HangingCatalog;

    #[async_trait]
    impl CatalogService for HangingCatalog {
        async fn fetch_catalog(&self) -> Result<Vec<CatalogRecord>> {
            tokio::time::sleep(Duration::from_secs(3_600)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_ensure_catalog_loaded_fetches_once() {
        let service = Arc::new(StaticCatalogService::new(vec![record("abc", "Overview")]));
        let resolver = DirectoryResolver::new(service.clone(), fast_policy(1));

        assert!(resolver.cached().await.is_none());
        resolver.ensure_catalog_loaded().await.unwrap();
        resolver.ensure_catalog_loaded().await.unwrap();

        assert_eq!(service.fetch_count(), 1);
        assert_eq!(resolver.cached().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_fetch() {
        let service = Arc::new(StaticCatalogService::new(vec![record("abc", "Overview")]));
        let resolver = DirectoryResolver::new(service.clone(), fast_policy(1));

        let (a, b) = tokio::join!(
            resolver.ensure_catalog_loaded(),
            resolver.ensure_catalog_loaded()
        );

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(service.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_refresh_and_invalidate() {
        let service = Arc::new(StaticCatalogService::new(vec![record("abc", "Overview")]));
        let resolver = DirectoryResolver::new(service.clone(), fast_policy(1));

        resolver.ensure_catalog_loaded().await.unwrap();
        resolver.refresh().await.unwrap();
        assert_eq!(service.fetch_count(), 2);

        resolver.invalidate().await;
        assert!(resolver.cached().await.is_none());
        resolver.ensure_catalog_loaded().await.unwrap();
        assert_eq!(service.fetch_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_with_backoff_then_succeeds() {
        let service = Arc::new(FlakyCatalog {
            failures: 2,
            calls: AtomicU32::new(0),
        });
        let resolver = DirectoryResolver::new(service.clone(), fast_policy(3));

        let catalog = resolver.ensure_catalog_loaded().await.unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(service.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let service = Arc::new(FlakyCatalog {
            failures: 10,
            calls: AtomicU32::new(0),
        });
        let resolver = DirectoryResolver::new(service.clone(), fast_policy(2));

        let err = resolver.ensure_catalog_loaded().await.unwrap_err();

        assert!(err.is_catalog_fetch());
        assert!(err.to_string().contains("giving up after 2 attempt(s)"));
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
        assert!(resolver.cached().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_fetch_times_out() {
        let resolver = DirectoryResolver::new(Arc::new(HangingCatalog), fast_policy(2));

        let err = resolver.ensure_catalog_loaded().await.unwrap_err();

        assert!(err.is_catalog_fetch());
        assert!(err.to_string().contains("timed out after 1000 ms"));
    }

    #[tokio::test]
    async fn test_resolve_ids() {
        let service = Arc::new(StaticCatalogService::new(vec![
            record("abc", "Overview"),
            record("def", "Details"),
        ]));
        let resolver = DirectoryResolver::new(service, fast_policy(1));
        let location = PageLocation::parse("http://localhost/d/xyz/slug?orgId=1").unwrap();

        let entries = resolver
            .resolve_ids(&["def".to_string(), "nope".to_string()], &location)
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display_name, "Details");
        assert_eq!(entries[0].canonical_url, "http://localhost/d/def?orgId=1");
    }
}
