//! ============================================================================
//! Schema Migrator - Bring any stored document up to the current layout
//! ============================================================================
//! Works on the raw JSON tree so that a partially broken document still
//! yields every recoverable item. Missing sections are back-filled, items
//! get a `preferences` block and an id when they lack one, and documents
//! from another version are stamped current. Unknown keys are kept.
//! ============================================================================

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::schema::{self, NumericField, TextField};
use crate::types::{
    new_item_id, now_iso, AppData, ClothingItem, ItemFields, Metadata, Preferences, Settings, Statistics,
    CURRENT_VERSION,
};

/// A migrated document and whether migration changed anything that must be
/// written back for later loads to see the same ids and version.
#[derive(Debug, Clone, PartialEq)]
pub struct Migration {
    pub data: AppData,
    /// Ids assigned, preferences synthesized, or the version stamped
    pub repaired: bool,
}

/// Migrate a parsed document. Never fails: anything unusable degrades to
/// the corresponding default.
pub fn migrate(raw: Value) -> AppData {
    migrate_document(raw).data
}

/// Like `migrate`, also reporting whether the stored form needs rewriting.
/// A non-object document yields defaults and is not marked repaired, so
/// callers never overwrite data they could not read.
pub fn migrate_document(raw: Value) -> Migration {
    let Value::Object(mut root) = raw else {
        warn!("Stored app data is not an object, starting from defaults");
        return Migration {
            data: AppData::initial(),
            repaired: false,
        };
    };

    let stored_version = root
        .get("version")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut repaired = false;
    let clothing_items = match root.remove("clothingItems") {
        Some(Value::Array(entries)) => entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| migrate_item(index, entry))
            .map(|(item, item_repaired)| {
                repaired |= item_repaired;
                item
            })
            .collect(),
        Some(other) => {
            warn!("clothingItems is not an array ({}), using empty collection", kind(&other));
            Vec::new()
        }
        None => Vec::new(),
    };

    let statistics: Statistics = section(root.remove("statistics"), "statistics");
    let settings: Settings = section(root.remove("settings"), "settings");
    let metadata = migrate_metadata(root.remove("metadata"));

    let mut data = AppData {
        version: stored_version.clone().unwrap_or_default(),
        clothing_items,
        statistics,
        settings,
        metadata,
    };

    if stored_version.as_deref() != Some(CURRENT_VERSION) {
        info!(
            "Migrating app data: {} -> {}",
            stored_version.as_deref().unwrap_or("unknown"),
            CURRENT_VERSION
        );
        data.version = CURRENT_VERSION.to_string();
        data.metadata.version = CURRENT_VERSION.to_string();
        data.metadata.last_updated = now_iso();
        repaired = true;
    }

    debug!("Migrated {} items (repaired: {})", data.clothing_items.len(), repaired);
    Migration { data, repaired }
}

/// Deserialize an optional section, falling back to its default
fn section<T: DeserializeOwned + Default>(value: Option<Value>, name: &str) -> T {
    match value {
        None | Some(Value::Null) => T::default(),
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            warn!("Stored {} section is unreadable ({}), using defaults", name, e);
            T::default()
        }),
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct PartialMetadata {
    created_at: Option<String>,
    last_updated: Option<String>,
    version: Option<String>,
}

fn migrate_metadata(value: Option<Value>) -> Metadata {
    let partial: PartialMetadata = section(value, "metadata");
    let fresh = Metadata::fresh();
    Metadata {
        created_at: partial.created_at.unwrap_or(fresh.created_at),
        last_updated: partial.last_updated.unwrap_or(fresh.last_updated),
        version: partial.version.unwrap_or(fresh.version),
    }
}

/// An item before its `preferences` block is settled
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LooseItem {
    id: String,
    #[serde(flatten)]
    fields: ItemFields,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    updated_at: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Repair one collection entry. Non-object entries are not items. The flag
/// is set when an id or preferences block had to be made up.
fn migrate_item(index: usize, entry: Value) -> Option<(ClothingItem, bool)> {
    let Value::Object(mut obj) = entry else {
        warn!("Skipping clothingItems[{}]: {} is not an item", index, kind(&entry));
        return None;
    };

    let mut repaired = normalize_id(&mut obj);

    for field in TextField::ALL {
        normalize_text(&mut obj, field.key());
    }
    for key in ["createdAt", "updatedAt"] {
        normalize_text(&mut obj, key);
    }
    for field in NumericField::ALL {
        normalize_numeric(&mut obj, field.key());
    }

    let stored_prefs = obj
        .remove("preferences")
        .and_then(|p| serde_json::from_value::<Preferences>(p).ok());

    let loose: LooseItem = match serde_json::from_value(Value::Object(obj)) {
        Ok(loose) => loose,
        Err(e) => {
            warn!("Skipping clothingItems[{}]: {}", index, e);
            return None;
        }
    };

    let preferences = match stored_prefs {
        Some(prefs) => prefs,
        None => {
            debug!("Synthesizing preferences for item {}", loose.id);
            repaired = true;
            schema::derive_preferences(&loose.fields)
        }
    };

    let item = ClothingItem {
        id: loose.id,
        fields: loose.fields,
        preferences,
        created_at: loose.created_at,
        updated_at: loose.updated_at,
        extra: loose.extra,
    };
    Some((item, repaired))
}

/// Returns whether the id was changed.
fn normalize_id(obj: &mut Map<String, Value>) -> bool {
    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.is_empty() => return false,
        Some(Value::Number(n)) => n.to_string(),
        _ => new_item_id(),
    };
    obj.insert("id".to_string(), Value::String(id));
    true
}

fn normalize_text(obj: &mut Map<String, Value>, key: &str) {
    let replacement = match obj.get(key) {
        None | Some(Value::String(_)) => return,
        Some(Value::Null) => None,
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    };
    match replacement {
        Some(text) => {
            obj.insert(key.to_string(), Value::String(text));
        }
        None => {
            obj.remove(key);
        }
    }
}

fn normalize_numeric(obj: &mut Map<String, Value>, key: &str) {
    let replacement = match obj.get(key) {
        None | Some(Value::Number(_)) => return,
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .and_then(serde_json::Number::from_f64),
        Some(_) => None,
    };
    match replacement {
        Some(number) => {
            obj.insert(key.to_string(), Value::Number(number));
        }
        None => {
            obj.remove(key);
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
