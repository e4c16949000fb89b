//! Breadcrumb reconciler.
//!
//! Decides what the trail becomes on page load, on a click in the trail and
//! on browser back navigation, and keeps the three copies of the trail
//! (URL parameter, session store, displayed list) in step.
//!
//! # Initialization
//!
//! 1. A root dashboard, or a session without a stored trail, starts empty.
//! 2. A `breadcrumb` URL parameter wins over the stored trail: its ids are
//!    resolved against the catalog and the result replaces the stored trail.
//! 3. Otherwise the stored trail is used.
//! 4. The current dashboard is appended unless already present, using a
//!    freshly fetched catalog.
//! 5. The oldest entries are evicted beyond the configured limit.
//! 6. The result is stored and published.
//! 7. The URL `breadcrumb` parameter is rewritten.
//! 8. A back-navigation listener is started.

use std::sync::{Arc, Weak};

use crumbtrail_core::breadcrumb::{BreadcrumbEntry, BreadcrumbList};
use crumbtrail_core::catalog::{self, CatalogRecord};
use crumbtrail_core::config::ReconcilerSettings;
use crumbtrail_core::error::{CrumbError, Result};
use crumbtrail_core::history::{BrowserHistory, NavigationEvent};
use crumbtrail_core::location::PageLocation;
use crumbtrail_core::options::PanelOptions;
use crumbtrail_core::query::{self, BREADCRUMB_PARAM, QueryParams};
use crumbtrail_core::storage::PersistedListStore;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;

use crate::directory::DirectoryResolver;

/// Lifecycle of a mounted breadcrumb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerState {
    Uninitialized,
    /// Catalog fetch in flight.
    Initializing,
    /// Trail materialized and published.
    Ready,
    /// The catalog could not be loaded; nothing is displayed.
    Degraded,
}

/// Where a click in the trail leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTarget {
    /// Link to follow, without any `breadcrumb` parameter.
    pub href: String,
    /// The entry's own query parameters, without `breadcrumb`.
    pub query: QueryParams,
}

struct Inner {
    state: ReconcilerState,
    list: BreadcrumbList,
}

pub struct BreadcrumbReconciler {
    options: PanelOptions,
    settings: ReconcilerSettings,
    resolver: Arc<DirectoryResolver>,
    store: PersistedListStore,
    history: Arc<dyn BrowserHistory>,
    events: broadcast::Sender<NavigationEvent>,
    inner: Mutex<Inner>,
    display: watch::Sender<BreadcrumbList>,
    back_listener: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl BreadcrumbReconciler {
    pub fn new(
        options: PanelOptions,
        settings: ReconcilerSettings,
        resolver: Arc<DirectoryResolver>,
        store: PersistedListStore,
        history: Arc<dyn BrowserHistory>,
        events: broadcast::Sender<NavigationEvent>,
    ) -> Self {
        let (display, _) = watch::channel(BreadcrumbList::new());
        Self {
            options,
            settings,
            resolver,
            store,
            history,
            events,
            inner: Mutex::new(Inner {
                state: ReconcilerState::Uninitialized,
                list: BreadcrumbList::new(),
            }),
            display,
            back_listener: std::sync::Mutex::new(None),
        }
    }

    pub fn options(&self) -> &PanelOptions {
        &self.options
    }

    pub async fn state(&self) -> ReconcilerState {
        self.inner.lock().await.state
    }

    /// The authoritative in-memory trail.
    pub async fn current_list(&self) -> BreadcrumbList {
        self.inner.lock().await.list.clone()
    }

    /// Receiver of the displayed trail. Updated only by initialization.
    pub fn subscribe(&self) -> watch::Receiver<BreadcrumbList> {
        self.display.subscribe()
    }

    /// Runs the initialization transition.
    ///
    /// Only the first call does any work; later calls return the current
    /// trail. A catalog that cannot be loaded leaves the reconciler
    /// [`ReconcilerState::Degraded`] with an empty display rather than an
    /// error. Storage and history failures are returned and also leave the
    /// reconciler degraded.
    pub async fn initialize(self: &Arc<Self>) -> Result<BreadcrumbList> {
        let mut inner = self.inner.lock().await;
        if inner.state != ReconcilerState::Uninitialized {
            tracing::debug!(state = ?inner.state, "breadcrumb already initialized");
            return Ok(inner.list.clone());
        }
        inner.state = ReconcilerState::Initializing;

        match self.load_trail(&mut inner).await {
            Ok(list) => Ok(list),
            Err(e) => {
                inner.state = ReconcilerState::Degraded;
                inner.list = BreadcrumbList::new();
                self.display.send_replace(BreadcrumbList::new());
                Err(e)
            }
        }
    }

    async fn load_trail(self: &Arc<Self>, inner: &mut Inner) -> Result<BreadcrumbList> {
        if self.options.is_root_dashboard || !self.store.exists()? {
            tracing::debug!(
                root = self.options.is_root_dashboard,
                "starting a fresh breadcrumb trail"
            );
            self.store.reset()?;
        }

        let location = self.history.location()?;
        let params = location.query_params();

        let working = match params.get(BREADCRUMB_PARAM).filter(|raw| !raw.is_empty()) {
            Some(raw) => {
                let ids = query::decode_id_list(raw);
                let resolved = match self.resolver.resolve_ids(&ids, &location).await {
                    Ok(entries) => BreadcrumbList::from_entries(entries),
                    Err(e) => return Ok(self.degrade(inner, e)),
                };
                tracing::debug!(
                    requested = ids.len(),
                    resolved = resolved.len(),
                    "breadcrumb taken from URL"
                );
                self.store.save(&resolved)?;
                resolved
            }
            None => self.store.load_or_default()?,
        };

        let catalog = match self.resolver.refresh().await {
            Ok(catalog) => catalog,
            Err(e) => return Ok(self.degrade(inner, e)),
        };

        let mut list = working.clone();
        append_current_page(&mut list, &catalog, &location);

        if let Some(max) = self.options.max_items() {
            let evicted = list.trim_to(max);
            if evicted > 0 {
                tracing::debug!(evicted, max, "trimmed breadcrumb trail");
            }
        }

        self.store.save(&list)?;
        inner.list = list.clone();
        inner.state = ReconcilerState::Ready;
        self.display.send_replace(list.clone());

        let url_trail = if self.settings.encode_current_page_in_url {
            &list
        } else {
            &working
        };
        let mut url_params = host_params(&params);
        url_params.insert(BREADCRUMB_PARAM, Some(url_trail.to_id_list()));
        self.history.replace_state(&url_params)?;

        self.start_back_listener();

        tracing::info!(
            entries = list.len(),
            dashboard = location.current_dashboard_id().unwrap_or_default(),
            "breadcrumb ready"
        );
        Ok(list)
    }

    /// Handles a click on the entry at `index` of the displayed trail.
    ///
    /// Unless the last displayed entry was clicked, entries after the clicked
    /// one are dropped and the shorter trail becomes the current and stored
    /// trail. The display is left as is; the destination page rebuilds it
    /// from the store.
    pub async fn navigate(&self, index: usize) -> Result<NavigationTarget> {
        let mut inner = self.inner.lock().await;
        let mut displayed = self.display.borrow().clone();
        let entry = displayed
            .get(index)
            .cloned()
            .ok_or_else(|| CrumbError::not_found("breadcrumb entry", index.to_string()))?;

        if displayed.truncate_after(index) {
            self.store.save(&displayed)?;
            tracing::debug!(index, remaining = displayed.len(), "truncated breadcrumb trail");
            inner.list = displayed;
        }

        Ok(navigation_target(&entry))
    }

    /// Handles one browser back navigation: drops the newest entry.
    ///
    /// Returns the dropped entry; an empty trail is left untouched.
    pub async fn handle_back_navigation(&self) -> Result<Option<BreadcrumbEntry>> {
        let mut inner = self.inner.lock().await;
        let Some(popped) = inner.list.pop() else {
            return Ok(None);
        };
        self.store.save(&inner.list)?;
        tracing::debug!(
            dropped = %popped.identity_key,
            remaining = inner.list.len(),
            "back navigation"
        );
        Ok(Some(popped))
    }

    /// Stops listening for back navigation.
    pub fn teardown(&self) {
        if let Ok(mut slot) = self.back_listener.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }

    /// Whether the back-navigation listener is running.
    pub fn is_listening(&self) -> bool {
        self.back_listener
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    fn start_back_listener(self: &Arc<Self>) {
        let mut events = self.events.subscribe();
        let reconciler: Weak<Self> = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(NavigationEvent::Back) => {
                        let Some(reconciler) = reconciler.upgrade() else {
                            break;
                        };
                        if let Err(e) = reconciler.handle_back_navigation().await {
                            tracing::warn!(
                                error = %e,
                                "failed to store trail after back navigation"
                            );
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "missed navigation events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        match self.back_listener.lock() {
            Ok(mut slot) => {
                if let Some(previous) = slot.replace(handle) {
                    previous.abort();
                }
            }
            Err(_) => handle.abort(),
        }
    }

    fn degrade(&self, inner: &mut Inner, error: CrumbError) -> BreadcrumbList {
        tracing::warn!(error = %error, "catalog unavailable, breadcrumb disabled");
        inner.state = ReconcilerState::Degraded;
        inner.list = BreadcrumbList::new();
        self.display.send_replace(BreadcrumbList::new());
        BreadcrumbList::new()
    }
}

impl Drop for BreadcrumbReconciler {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for BreadcrumbReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BreadcrumbReconciler")
            .field("options", &self.options)
            .field("settings", &self.settings)
            .finish()
    }
}

/// Appends the dashboard at `location` unless it is unknown or already present.
///
/// Returns `true` when an entry was appended.
pub fn append_current_page(
    list: &mut BreadcrumbList,
    catalog: &[CatalogRecord],
    location: &PageLocation,
) -> bool {
    let Some(id) = location.current_dashboard_id() else {
        tracing::debug!(path = location.pathname(), "not a dashboard path");
        return false;
    };
    let Some(record) = catalog::resolve_by_id_suffix(id, catalog) else {
        tracing::debug!(id, "current dashboard not in catalog, not appended");
        return false;
    };

    list.push_unique(BreadcrumbEntry {
        identity_key: record.uid.clone(),
        path: format!("/d/{}", record.uid),
        display_name: record.title.clone(),
        query_string: location.query_params().to_param_chain(&[BREADCRUMB_PARAM]),
        canonical_url: location.href().to_string(),
    })
}

/// Current query parameters that carry a value, minus `breadcrumb`.
fn host_params(params: &QueryParams) -> QueryParams {
    let mut host = QueryParams::new();
    for (key, value) in params.iter() {
        match value {
            Some(v) if key != BREADCRUMB_PARAM && !v.is_empty() && v != "null" => {
                host.insert(key, Some(v.to_string()));
            }
            _ => {}
        }
    }
    host
}

fn navigation_target(entry: &BreadcrumbEntry) -> NavigationTarget {
    let mut query = QueryParams::new();
    for (key, value) in query::decode(&entry.query_string).iter() {
        if !key.is_empty() && key != BREADCRUMB_PARAM {
            query.insert(key, value.map(str::to_string));
        }
    }

    let href = match PageLocation::parse(&entry.canonical_url) {
        Ok(mut link) => {
            let mut params = link.query_params();
            if params.contains_key(BREADCRUMB_PARAM) {
                params.remove(BREADCRUMB_PARAM);
                link.set_query(&params);
            }
            link.href().to_string()
        }
        // Host-relative links carry no breadcrumb parameter of their own.
        Err(_) => entry.canonical_url.clone(),
    };

    NavigationTarget { href, query }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(uid: &str, canonical_url: &str, query_string: &str) -> BreadcrumbEntry {
        BreadcrumbEntry {
            identity_key: uid.to_string(),
            path: format!("/d/{}", uid),
            display_name: uid.to_string(),
            query_string: query_string.to_string(),
            canonical_url: canonical_url.to_string(),
        }
    }

    #[test]
    fn test_append_current_page_builds_entry() {
        let catalog = vec![CatalogRecord {
            url: "/d/abc/overview".to_string(),
            title: "Overview".to_string(),
            uid: "abc".to_string(),
        }];
        let location =
            PageLocation::parse("http://localhost/d/abc/overview?orgId=1&breadcrumb=x&from=now-6h")
                .unwrap();
        let mut list = BreadcrumbList::new();

        assert!(append_current_page(&mut list, &catalog, &location));
        assert!(!append_current_page(&mut list, &catalog, &location));

        let appended = list.last().unwrap();
        assert_eq!(appended.identity_key, "abc");
        assert_eq!(appended.path, "/d/abc");
        assert_eq!(appended.display_name, "Overview");
        assert_eq!(appended.query_string, "&orgId=1&from=now-6h");
        assert_eq!(appended.canonical_url, location.href());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_append_unknown_page_is_skipped() {
        let location = PageLocation::parse("http://localhost/d/zzz/unknown").unwrap();
        let mut list = BreadcrumbList::new();
        assert!(!append_current_page(&mut list, &[], &location));
        assert!(list.is_empty());
    }

    #[test]
    fn test_host_params_drop_breadcrumb_and_empty_values() {
        let params = query::decode("?orgId=1&breadcrumb=a,b&kiosk&var-x=null&to=now");
        assert_eq!(query::encode(&host_params(&params)), "?orgId=1&to=now");
    }

    #[test]
    fn test_navigation_target_strips_breadcrumb() {
        let target = navigation_target(&entry(
            "abc",
            "http://localhost/d/abc/overview?orgId=1&breadcrumb=x,y",
            "&orgId=1&breadcrumb=x,y",
        ));
        assert_eq!(target.href, "http://localhost/d/abc/overview?orgId=1");
        assert_eq!(query::encode(&target.query), "?orgId=1");
    }

    #[test]
    fn test_navigation_target_relative_link() {
        let target = navigation_target(&entry("abc", "/d/abc?orgId=2", "?orgId=2"));
        assert_eq!(target.href, "/d/abc?orgId=2");
        assert_eq!(target.query.get("orgId"), Some("2"));
    }

    #[test]
    fn test_navigation_target_empty_query() {
        let target = navigation_target(&entry("abc", "http://localhost/d/abc", ""));
        assert!(target.query.is_empty());
        assert_eq!(target.href, "http://localhost/d/abc");
    }
}
