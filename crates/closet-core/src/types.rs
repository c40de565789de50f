//! ============================================================================
//! Data Model - Persisted records for the closet app
//! ============================================================================
//! Everything here serializes to the camelCase JSON layout stored under the
//! `clothingAppData` slot.
//! ============================================================================

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::schema::NumericField;

/// Schema version written by this build
pub const CURRENT_VERSION: &str = "1.1.0";

/// Current time as an ISO-8601 string (`2024-05-01T09:30:00.000Z`)
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Fresh opaque item id
pub fn new_item_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The user-editable attributes of a garment.
///
/// Text fields default to empty, numeric attributes to 50 (colorHue to 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemFields {
    pub name: String,
    pub color: String,
    pub silhouette: String,
    pub material: String,
    pub brand: String,
    pub fit: String,
    pub category: String,
    pub usage_scene: String,
    pub personal_values: String,
    pub purchase_info: String,

    /// Hue in degrees; staged records carry the raw 0-360 slider value
    pub color_hue: f64,
    pub price: f64,
    pub silhouette_value: f64,
    pub material_value: f64,
    pub emotion: f64,
    pub fit_value: f64,
    pub values: f64,
}

impl Default for ItemFields {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: String::new(),
            silhouette: String::new(),
            material: String::new(),
            brand: String::new(),
            fit: String::new(),
            category: String::new(),
            usage_scene: String::new(),
            personal_values: String::new(),
            purchase_info: String::new(),
            color_hue: NumericField::ColorHue.default_value(),
            price: NumericField::Price.default_value(),
            silhouette_value: NumericField::SilhouetteValue.default_value(),
            material_value: NumericField::MaterialValue.default_value(),
            emotion: NumericField::Emotion.default_value(),
            fit_value: NumericField::FitValue.default_value(),
            values: NumericField::Values.default_value(),
        }
    }
}

/// Denormalized snapshot of the seven numeric attributes plus their mean
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub color: f64,
    pub price: f64,
    pub silhouette: f64,
    pub material: f64,
    pub emotion: f64,
    pub fit: f64,
    pub values: f64,
    /// Rounded mean of the seven source values, clamped to 0-100
    pub overall: f64,
}

/// One user-recorded garment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClothingItem {
    pub id: String,
    #[serde(flatten)]
    pub fields: ItemFields,
    pub preferences: Preferences,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    /// Keys this build does not know about, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Min/max/average over the `price` attribute
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

/// Aggregates derived from the collection. Never authoritative.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistics {
    pub total_items: usize,
    pub average_preference: f64,
    pub favorite_category: Option<String>,
    pub category_distribution: BTreeMap<String, usize>,
    pub price_range: PriceRange,
}

/// User settings carried alongside the collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: String,
    pub language: String,
    pub currency: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: "light".to_string(),
            language: "ja".to_string(),
            currency: "JPY".to_string(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub created_at: String,
    pub last_updated: String,
    pub version: String,
}

impl Metadata {
    pub fn fresh() -> Self {
        let now = now_iso();
        Self {
            created_at: now.clone(),
            last_updated: now,
            version: CURRENT_VERSION.to_string(),
        }
    }
}

/// Persisted root document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    pub version: String,
    pub clothing_items: Vec<ClothingItem>,
    pub statistics: Statistics,
    pub settings: Settings,
    pub metadata: Metadata,
}

impl AppData {
    /// Structure used on first launch and whenever stored data is unusable
    pub fn initial() -> Self {
        Self {
            version: CURRENT_VERSION.to_string(),
            clothing_items: Vec::new(),
            statistics: Statistics::default(),
            settings: Settings::default(),
            metadata: Metadata::fresh(),
        }
    }

    pub fn find_index(&self, id: &str) -> Option<usize> {
        self.clothing_items.iter().position(|item| item.id == id)
    }
}
