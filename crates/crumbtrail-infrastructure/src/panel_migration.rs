//! Migration of saved breadcrumb panels to the nested options shape.
//!
//! Panels saved before plugin version 1.2.0 kept their options as top-level
//! fields of the panel model. Current panels keep them under `options`.

use crumbtrail_core::error::{CrumbError, Result};
use crumbtrail_core::options::{ItemLimit, PanelOptions};
use semver::Version;
use serde_json::{Map, Value};

/// First plugin version that stores options only under `options`.
pub const NESTED_OPTIONS_VERSION: Version = Version::new(1, 2, 0);

/// Assumed version of panels saved without `pluginVersion`.
pub const DEFAULT_PLUGIN_VERSION: &str = "1.0.0";

/// Top-level fields used by legacy panels.
pub const LEGACY_FIELDS: [&str; 3] = [
    "isRootDashboard",
    "hideTextInRootDashboard",
    "breadcrumbItemsMaxAmount",
];

/// Produces current options for a saved panel model.
///
/// Values already under `options` win over legacy top-level fields. When the
/// panel was saved by a plugin older than 1.2.0, the legacy fields are
/// removed from `panel` in place.
pub fn migrate_panel(panel: &mut Value) -> Result<PanelOptions> {
    let panel = panel
        .as_object_mut()
        .ok_or_else(|| CrumbError::migration("panel model is not a JSON object"))?;

    let nested = panel
        .get("options")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let migrated = PanelOptions {
        is_root_dashboard: coalesce(&nested, panel, "isRootDashboard")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        hide_text_in_root_dashboard: coalesce(&nested, panel, "hideTextInRootDashboard")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        breadcrumb_items_max_amount: migrate_item_limit(&nested, panel)?,
    };

    let previous = previous_version(panel);
    if previous < NESTED_OPTIONS_VERSION {
        tracing::info!(
            from = %previous,
            "removing legacy top-level breadcrumb options"
        );
        for field in LEGACY_FIELDS {
            panel.remove(field);
        }
    }

    Ok(migrated)
}

/// `options.<field> ?? panel.<field>`, treating `null` as absent.
fn coalesce<'a>(
    nested: &'a Map<String, Value>,
    panel: &'a Map<String, Value>,
    field: &str,
) -> Option<&'a Value> {
    nested
        .get(field)
        .filter(|v| !v.is_null())
        .or_else(|| panel.get(field).filter(|v| !v.is_null()))
}

fn migrate_item_limit(
    nested: &Map<String, Value>,
    panel: &Map<String, Value>,
) -> Result<Option<ItemLimit>> {
    const FIELD: &str = "breadcrumbItemsMaxAmount";

    if let Some(value) = nested.get(FIELD).filter(|v| !v.is_null()) {
        return Ok(Some(serde_json::from_value(value.clone())?));
    }

    // Legacy values were stored as free text and read with parseInt.
    let legacy = panel.get(FIELD).and_then(|value| match value {
        Value::String(s) => ItemLimit::Text(s.clone()).as_integer(),
        Value::Number(n) => ItemLimit::from_number(n).and_then(|l| l.as_integer()),
        _ => None,
    });
    Ok(legacy.map(ItemLimit::Integer))
}

fn previous_version(panel: &Map<String, Value>) -> Version {
    let raw = panel
        .get("pluginVersion")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_PLUGIN_VERSION);

    match Version::parse(raw) {
        Ok(version) => version,
        Err(e) => {
            tracing::warn!(
                version = raw,
                error = %e,
                "unparsable plugin version, treating as legacy"
            );
            Version::new(0, 0, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_panel_is_migrated_and_cleaned() {
        let mut panel = json!({
            "type": "breadcrumb-panel",
            "isRootDashboard": true,
            "hideTextInRootDashboard": true,
            "breadcrumbItemsMaxAmount": "7",
            "options": {}
        });

        let options = migrate_panel(&mut panel).unwrap();

        assert!(options.is_root_dashboard);
        assert!(options.hide_text_in_root_dashboard);
        assert_eq!(options.max_items(), Some(7));
        for field in LEGACY_FIELDS {
            assert!(panel.get(field).is_none(), "{} should be removed", field);
        }
        assert_eq!(panel["type"], "breadcrumb-panel");
    }

    #[test]
    fn test_nested_options_win() {
        let mut panel = json!({
            "pluginVersion": "1.1.0",
            "isRootDashboard": true,
            "breadcrumbItemsMaxAmount": "7",
            "options": {
                "isRootDashboard": false,
                "breadcrumbItemsMaxAmount": 3
            }
        });

        let options = migrate_panel(&mut panel).unwrap();

        assert!(!options.is_root_dashboard);
        assert_eq!(options.max_items(), Some(3));
    }

    #[test]
    fn test_current_panel_keeps_top_level_fields() {
        let mut panel = json!({
            "pluginVersion": "1.10.0",
            "isRootDashboard": true,
            "options": { "hideTextInRootDashboard": true }
        });

        let options = migrate_panel(&mut panel).unwrap();

        // 1.10.0 is newer than 1.2.0 even though it sorts lower as a string
        assert_eq!(panel["isRootDashboard"], true);
        assert!(options.is_root_dashboard);
        assert!(options.hide_text_in_root_dashboard);
    }

    #[test]
    fn test_non_numeric_legacy_limit_means_no_limit() {
        let mut panel = json!({ "breadcrumbItemsMaxAmount": "lots" });
        let options = migrate_panel(&mut panel).unwrap();
        assert_eq!(options.breadcrumb_items_max_amount, None);
        assert_eq!(options.max_items(), None);
    }

    #[test]
    fn test_unparsable_version_is_legacy() {
        let mut panel = json!({ "pluginVersion": "1.2", "isRootDashboard": true });
        migrate_panel(&mut panel).unwrap();
        assert!(panel.get("isRootDashboard").is_none());
    }

    #[test]
    fn test_non_object_panel_is_rejected() {
        let mut panel = json!([1, 2]);
        let err = migrate_panel(&mut panel).unwrap_err();
        assert!(matches!(err, CrumbError::Migration(_)));
    }
}
