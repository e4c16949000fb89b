//! Default file locations.
//!
//! ```text
//! ~/.config/crumbtrail/         # Config directory
//! └── config.toml               # Application configuration
//!
//! ~/.local/share/crumbtrail/    # Data directory
//! └── session.json              # File-backed session store
//! ```

use std::path::PathBuf;

use crumbtrail_core::error::{CrumbError, Result};

const APP_DIR: &str = "crumbtrail";

pub struct CrumbtrailPaths;

impl CrumbtrailPaths {
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| CrumbError::config("Cannot find config directory"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| CrumbError::config("Cannot find data directory"))
    }

    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn session_file() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("session.json"))
    }
}
