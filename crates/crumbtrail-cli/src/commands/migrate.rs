use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use crumbtrail_infrastructure::migrate_panel;
use serde_json::Value;

/// Migrates the panel model in `path` and stores the result under `options`.
pub fn run(path: &Path, in_place: bool) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut panel: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let options = migrate_panel(&mut panel).context("Failed to migrate panel")?;
    if let Some(model) = panel.as_object_mut() {
        model.insert("options".to_string(), serde_json::to_value(&options)?);
    }

    let output = serde_json::to_string_pretty(&panel)?;
    if in_place {
        fs::write(path, format!("{}\n", output))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Migrated {}", path.display());
    } else {
        println!("{}", output);
    }
    Ok(())
}
