//! ============================================================================
//! Staged Input - Records written by the entry flow
//! ============================================================================
//! The entry page keys its text inputs by their Japanese labels and its
//! sliders by element id. Conversion into a collection item goes through
//! the field table in `schema`.
//! ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{self, NumericField, TextField};
use crate::types::{now_iso, ClothingItem, ItemFields};

/// Name given to staged records that arrive without one
pub const UNNAMED_ITEM: &str = "未命名アイテム";

/// One record as the entry flow stores it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedRecord {
    /// Scalars other than strings are kept as their text; `null` is absent
    #[serde(default, deserialize_with = "deserialize_labels")]
    pub table_data: BTreeMap<String, String>,
    /// `null` when the slider value could not be read as an integer
    #[serde(default)]
    pub slider_data: BTreeMap<String, Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl StagedRecord {
    /// Empty record stamped with the current time
    pub fn now() -> Self {
        Self {
            timestamp: Some(now_iso()),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, field: TextField, value: impl Into<String>) -> Self {
        self.table_data
            .insert(field.staged_label().to_string(), value.into());
        self
    }

    pub fn with_slider(mut self, field: NumericField, value: f64) -> Self {
        self.slider_data
            .insert(field.slider_key().to_string(), Some(value));
        self
    }

    fn text(&self, field: TextField) -> Option<&str> {
        self.table_data.get(field.staged_label()).map(String::as_str)
    }

    fn slider(&self, field: NumericField) -> Option<f64> {
        self.slider_data
            .get(field.slider_key())
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
    }

    /// Build a collection item. Slider values are taken as-is; a missing
    /// slider falls back to the field default.
    pub fn to_item(&self, id: String) -> ClothingItem {
        let mut fields = ItemFields::default();
        for field in TextField::ALL {
            if let Some(value) = self.text(field) {
                *field.get_mut(&mut fields) = value.to_string();
            }
        }
        if fields.name.is_empty() {
            fields.name = UNNAMED_ITEM.to_string();
        }
        for field in NumericField::ALL {
            if let Some(value) = self.slider(field) {
                field.set(&mut fields, value);
            }
        }

        let now = now_iso();
        ClothingItem {
            id,
            preferences: schema::derive_preferences(&fields),
            fields,
            created_at: self.timestamp.clone().unwrap_or_else(|| now.clone()),
            updated_at: now,
            extra: Default::default(),
        }
    }
}

fn deserialize_labels<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(label, value)| match value {
            Value::Null => None,
            Value::String(text) => Some((label, text)),
            other => Some((label, other.to_string())),
        })
        .collect())
}
