//! Domain types and host-facing traits for the Crumbtrail breadcrumb.
//!
//! A breadcrumb trail lives in three places at once: the `breadcrumb` URL
//! parameter, the session store, and the list currently on screen. This
//! crate holds the pieces all three share: the entry/list model, the
//! query-string codec, catalog matching, and the traits through which the
//! host application is reached.

pub mod breadcrumb;
pub mod catalog;
pub mod config;
pub mod error;
pub mod history;
pub mod location;
pub mod options;
pub mod query;
pub mod storage;

// Re-export common error type
pub use error::{CrumbError, Result};

pub use breadcrumb::{BreadcrumbEntry, BreadcrumbList};
pub use catalog::{CatalogRecord, CatalogService, StaticCatalogService};
pub use config::{CatalogConfig, CrumbtrailConfig, ReconcilerSettings, RetryPolicy};
pub use history::{BrowserHistory, MemoryHistory, NavigationEvent};
pub use location::PageLocation;
pub use options::PanelOptions;
pub use query::QueryParams;
pub use storage::{MemorySessionStore, PersistedListStore, SessionStore};
