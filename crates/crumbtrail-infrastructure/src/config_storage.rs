//! TOML configuration file loading.

use std::fs;
use std::path::{Path, PathBuf};

use crumbtrail_core::config::CrumbtrailConfig;
use crumbtrail_core::error::{CrumbError, Result};

use crate::paths::CrumbtrailPaths;

/// Reads [`CrumbtrailConfig`] from a TOML file.
///
/// A missing or empty file yields the default configuration; a file that
/// exists but does not parse is a configuration error.
#[derive(Debug, Clone)]
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at the platform default location.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(CrumbtrailPaths::config_file()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<CrumbtrailConfig> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "config file not found, using defaults");
            return Ok(CrumbtrailConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(CrumbtrailConfig::default());
        }

        toml::from_str(&content).map_err(|e| {
            CrumbError::config(format!("{}: {}", self.path.display(), e))
        })
    }

    /// Writes `config` as pretty TOML, creating parent directories.
    pub fn save(&self, config: &CrumbtrailConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = toml::to_string_pretty(config)
            .map_err(|e| CrumbError::Serialization {
                format: "TOML".to_string(),
                message: e.to_string(),
            })?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crumbtrail_core::options::ItemLimit;
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::new(temp_dir.path().join("config.toml"));
        assert_eq!(storage.load().unwrap(), CrumbtrailConfig::default());
    }

    #[test]
    fn test_load_full_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[panel]
is_root_dashboard = true
breadcrumb_items_max_amount = 5

[catalog]
base_url = "http://grafana:3000"
timeout_ms = 1500
max_attempts = 4

[reconciler]
encode_current_page_in_url = true

[storage]
session_file = "/tmp/crumbs.json"
"#,
        )
        .unwrap();

        let config = ConfigStorage::new(&path).load().unwrap();
        assert!(config.panel.is_root_dashboard);
        assert!(!config.panel.hide_text_in_root_dashboard);
        assert_eq!(config.panel.max_items(), Some(5));
        assert_eq!(config.catalog.search_url(), "http://grafana:3000/api/search");
        assert_eq!(config.catalog.retry.timeout_ms, 1500);
        assert_eq!(config.catalog.retry.max_attempts, 4);
        assert_eq!(config.catalog.retry.initial_backoff_ms, 200);
        assert!(config.reconciler.encode_current_page_in_url);
        assert_eq!(
            config.storage.session_file,
            Some(PathBuf::from("/tmp/crumbs.json"))
        );
    }

    #[test]
    fn test_text_limit_in_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[panel]\nbreadcrumb_items_max_amount = \"many\"\n").unwrap();

        let config = ConfigStorage::new(&path).load().unwrap();
        assert_eq!(
            config.panel.breadcrumb_items_max_amount,
            Some(ItemLimit::Text("many".to_string()))
        );
        assert_eq!(config.panel.max_items(), None);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[panel\n").unwrap();
        assert!(ConfigStorage::new(&path).load().unwrap_err().is_config());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::new(temp_dir.path().join("sub/config.toml"));
        let mut config = CrumbtrailConfig::default();
        config.panel.hide_text_in_root_dashboard = true;

        storage.save(&config).unwrap();

        assert_eq!(storage.load().unwrap(), config);
    }
}
