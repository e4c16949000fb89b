//! Error types for Crumbtrail.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for every Crumbtrail crate.
///
/// Most failures in breadcrumb handling are swallowed close to where they
/// happen (an unknown dashboard id is simply dropped), so the variants here
/// cover the few conditions that do propagate: catalog access, storage
/// access, configuration and migration.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum CrumbError {
    /// The catalog service could not be reached or returned garbage.
    #[error("Catalog fetch failed: {message}")]
    CatalogFetch { message: String },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Session storage read/write error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Panel options migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CrumbError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a CatalogFetch error
    pub fn catalog_fetch(message: impl Into<String>) -> Self {
        Self::CatalogFetch {
            message: message.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Migration error
    pub fn migration(message: impl Into<String>) -> Self {
        Self::Migration(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a catalog fetch failure
    pub fn is_catalog_fetch(&self) -> bool {
        matches!(self, Self::CatalogFetch { .. })
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a storage error
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for CrumbError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for CrumbError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for CrumbError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for CrumbError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::CatalogFetch {
                message: format!("invalid catalog payload: {}", err),
            }
        } else {
            Self::CatalogFetch {
                message: err.to_string(),
            }
        }
    }
}

impl From<semver::Error> for CrumbError {
    fn from(err: semver::Error) -> Self {
        Self::Migration(err.to_string())
    }
}

impl From<url::ParseError> for CrumbError {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("invalid URL: {}", err))
    }
}

/// A type alias for `Result<T, CrumbError>`.
pub type Result<T> = std::result::Result<T, CrumbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_helpers() {
        assert!(CrumbError::catalog_fetch("down").is_catalog_fetch());
        assert!(CrumbError::not_found("breadcrumb entry", "7").is_not_found());
        assert!(CrumbError::storage("full").is_storage());
        assert!(CrumbError::config("bad").is_config());
    }

    #[test]
    fn test_json_error_conversion() {
        let err: CrumbError = serde_json::from_str::<Vec<u8>>("not json")
            .unwrap_err()
            .into();
        assert!(err.is_serialization());
        assert!(err.to_string().starts_with("Serialization error: JSON"));
    }

    #[test]
    fn test_not_found_display() {
        let err = CrumbError::not_found("breadcrumb entry", "4");
        assert_eq!(err.to_string(), "Entity not found: breadcrumb entry '4'");
    }
}
