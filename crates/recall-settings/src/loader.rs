//! Store persistence with deep merge.
//!
//! The store persists as one JSON document. On load, the file's values are
//! deep-merged over compiled defaults so documents written by older versions
//! pick up new fields without losing anything.
//!
//! Deep merge rules:
//! - Objects merge recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::store::SettingsStore;

/// Load a settings store from a JSON file.
///
/// A missing file yields the default store; invalid JSON is an error.
pub fn load_store_from_path(path: &Path) -> Result<SettingsStore> {
    let defaults = serde_json::to_value(SettingsStore::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings store from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings store file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Write a settings store to a JSON file, creating parent directories.
pub fn save_store_to_path(store: &SettingsStore, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(store)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
