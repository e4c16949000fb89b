use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use crumbtrail_application::{
    BreadcrumbPanel, BreadcrumbReconciler, DirectoryResolver, ReconcilerState,
};
use crumbtrail_core::catalog::CatalogService;
use crumbtrail_core::config::CrumbtrailConfig;
use crumbtrail_core::history::{BrowserHistory, MemoryHistory, NavigationEvent};
use crumbtrail_core::storage::{PersistedListStore, SessionStore};
use crumbtrail_infrastructure::{
    CrumbtrailPaths, HttpCatalogService, JsonFileSessionStore, load_catalog_file,
};
use tokio::sync::broadcast;

/// Session key holding the URL of the page the CLI is "on".
const LOCATION_KEY: &str = "crumbtrail.location";

/// Wiring shared by the trail commands.
pub struct Session {
    config: CrumbtrailConfig,
    store: Arc<JsonFileSessionStore>,
    catalog: Arc<dyn CatalogService>,
    events: broadcast::Sender<NavigationEvent>,
}

/// A page that has been loaded with a mounted breadcrumb.
pub struct Page {
    pub panel: BreadcrumbPanel,
    pub reconciler: Arc<BreadcrumbReconciler>,
    /// Page URL after the breadcrumb rewrote its query.
    pub location: String,
}

impl Session {
    pub fn open(
        config: CrumbtrailConfig,
        session_file: Option<PathBuf>,
        catalog_file: Option<&Path>,
    ) -> Result<Self> {
        let path = match session_file.or_else(|| config.storage.session_file.clone()) {
            Some(path) => path,
            None => CrumbtrailPaths::session_file().context("Failed to locate session file")?,
        };
        let store = JsonFileSessionStore::new(&path)
            .with_context(|| format!("Failed to open session store at {}", path.display()))?;

        let catalog: Arc<dyn CatalogService> = match catalog_file {
            Some(file) => Arc::new(
                load_catalog_file(file)
                    .with_context(|| format!("Failed to load catalog from {}", file.display()))?,
            ),
            None => Arc::new(HttpCatalogService::new(&config.catalog)),
        };

        tracing::debug!(session = %path.display(), "session opened");
        let (events, _) = broadcast::channel(16);
        Ok(Self {
            config,
            store: Arc::new(store),
            catalog,
            events,
        })
    }

    pub fn list_store(&self) -> PersistedListStore {
        PersistedListStore::new(self.store.clone())
    }

    /// Loads `href` and mounts a breadcrumb panel on it.
    pub async fn open_page(&self, href: &str) -> Result<Page> {
        let history = Arc::new(
            MemoryHistory::parse(href).with_context(|| format!("Invalid page URL: {}", href))?,
        );
        let resolver = Arc::new(DirectoryResolver::new(
            self.catalog.clone(),
            self.config.catalog.retry.clone(),
        ));
        let reconciler = Arc::new(BreadcrumbReconciler::new(
            self.config.panel.clone(),
            self.config.reconciler.clone(),
            resolver,
            self.list_store(),
            history.clone(),
            self.events.clone(),
        ));

        let mut panel = BreadcrumbPanel::new(reconciler.clone());
        panel
            .mount()
            .await
            .context("Failed to initialize breadcrumb")?;

        if reconciler.state().await == ReconcilerState::Degraded {
            eprintln!("warning: dashboard catalog unavailable, breadcrumb disabled");
        }

        let location = history.location()?.href().to_string();
        self.remember_location(&location)?;

        Ok(Page {
            panel,
            reconciler,
            location,
        })
    }

    /// The page to act on: `url` if given, else the last page visited.
    pub fn current_page(&self, url: Option<String>) -> Result<String> {
        if let Some(url) = url {
            return Ok(url);
        }
        self.store
            .get_item(LOCATION_KEY)?
            .context("No page visited yet; run `crumbtrail visit <url>` first")
    }

    pub fn remember_location(&self, href: &str) -> Result<()> {
        self.store.set_item(LOCATION_KEY, href)?;
        Ok(())
    }

    pub fn forget_location(&self) -> Result<()> {
        self.store.remove_item(LOCATION_KEY)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crumbtrail_core::error::CrumbError;
    use tempfile::TempDir;

    fn open_session(dir: &TempDir) -> Session {
        let catalog = dir.path().join("catalog.json");
        std::fs::write(&catalog, "[]").unwrap();
        Session::open(
            CrumbtrailConfig::default(),
            Some(dir.path().join("session.json")),
            Some(catalog.as_path()),
        )
        .unwrap()
    }

    #[test]
    fn test_current_page_falls_back_to_last_location() {
        let dir = TempDir::new().unwrap();
        let session = open_session(&dir);

        let err = session.current_page(None).err().unwrap();
        assert!(err.to_string().contains("No page visited yet"));

        session.remember_location("http://localhost/d/abc/x").unwrap();
        assert_eq!(session.current_page(None).unwrap(), "http://localhost/d/abc/x");
        assert_eq!(
            session.current_page(Some("http://localhost/d/def/y".to_string())).unwrap(),
            "http://localhost/d/def/y"
        );

        session.forget_location().unwrap();
        assert!(session.current_page(None).is_err());
    }

    #[test]
    fn test_library_error_kept_behind_context() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");

        let err = Session::open(
            CrumbtrailConfig::default(),
            Some(dir.path().join("session.json")),
            Some(missing.as_path()),
        )
        .err()
        .unwrap();

        assert!(err.to_string().contains("Failed to load catalog"));
        let cause = err.downcast_ref::<CrumbError>().unwrap();
        assert!(cause.is_catalog_fetch());
    }
}
