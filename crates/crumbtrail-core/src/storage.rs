//! Session-scoped storage of the breadcrumb trail.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::breadcrumb::BreadcrumbList;
use crate::error::{CrumbError, Result};

/// Session storage key holding the JSON-encoded trail.
pub const DASHLIST_KEY: &str = "dashlist";

/// Session-scoped string key/value storage, the `sessionStorage` of the host.
pub trait SessionStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    fn remove_item(&self, key: &str) -> Result<()>;
}

/// In-process session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self
            .items
            .read()
            .map_err(|e| CrumbError::storage(format!("session store lock poisoned: {}", e)))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self
            .items
            .write()
            .map_err(|e| CrumbError::storage(format!("session store lock poisoned: {}", e)))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self
            .items
            .write()
            .map_err(|e| CrumbError::storage(format!("session store lock poisoned: {}", e)))?;
        items.remove(key);
        Ok(())
    }
}

/// Typed accessor for the trail kept under [`DASHLIST_KEY`].
///
/// Every save replaces the whole value with one `set_item` call, so readers
/// sharing the session store see one complete trail or another, never a
/// mix. Concurrent writers are last-writer-wins.
#[derive(Clone)]
pub struct PersistedListStore {
    store: Arc<dyn SessionStore>,
}

impl PersistedListStore {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Whether a trail has been written in this session.
    pub fn exists(&self) -> Result<bool> {
        Ok(self.store.get_item(DASHLIST_KEY)?.is_some())
    }

    /// Loads the trail. `None` when nothing has been stored yet.
    ///
    /// A stored value that does not parse is treated as an empty trail.
    pub fn load(&self) -> Result<Option<BreadcrumbList>> {
        let Some(raw) = self.store.get_item(DASHLIST_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<BreadcrumbList>(&raw) {
            Ok(list) => Ok(Some(BreadcrumbList::from_entries(list.entries().to_vec()))),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "stored breadcrumb list is unreadable, treating as empty"
                );
                Ok(Some(BreadcrumbList::new()))
            }
        }
    }

    /// Loads the trail, empty when unset.
    pub fn load_or_default(&self) -> Result<BreadcrumbList> {
        Ok(self.load()?.unwrap_or_default())
    }

    pub fn save(&self, list: &BreadcrumbList) -> Result<()> {
        let json = serde_json::to_string(list)?;
        self.store.set_item(DASHLIST_KEY, &json)
    }

    /// Replaces the stored trail with an empty one.
    pub fn reset(&self) -> Result<()> {
        self.save(&BreadcrumbList::new())
    }
}

impl std::fmt::Debug for PersistedListStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedListStore")
            .field("key", &DASHLIST_KEY)
            .finish()
    }
}
