pub mod config_storage;
pub mod http_catalog_service;
pub mod json_file_session_store;
pub mod panel_migration;
pub mod paths;

pub use crate::config_storage::ConfigStorage;
pub use crate::http_catalog_service::{HttpCatalogService, load_catalog_file};
pub use crate::json_file_session_store::JsonFileSessionStore;
pub use crate::panel_migration::migrate_panel;
pub use crate::paths::CrumbtrailPaths;
