//! ============================================================================
//! Validator - Admission checks for candidate items
//! ============================================================================
//! Collects every violation before failing. On success the result carries
//! the full normalized field set plus which fields the caller supplied, so
//! an update can merge only what was actually sent.
//! ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::schema::{self, NumericField, TextField, TEXT_MAX_LEN};
use crate::types::{ClothingItem, ItemFields, Preferences};

/// A numeric attribute as it arrives from a form: a number or raw text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

impl NumericInput {
    /// Coerce like a form field: blank text reads as 0, anything that does
    /// not parse to a finite number is rejected.
    pub fn coerce(&self) -> Option<f64> {
        let value = match self {
            NumericInput::Number(n) => *n,
            NumericInput::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().ok()?
                }
            }
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for NumericInput {
    fn from(value: f64) -> Self {
        NumericInput::Number(value)
    }
}

impl From<&str> for NumericInput {
    fn from(value: &str) -> Self {
        NumericInput::Text(value.to_string())
    }
}

/// Candidate item data supplied by a caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemInput {
    pub name: Option<String>,
    pub color: Option<String>,
    pub silhouette: Option<String>,
    pub material: Option<String>,
    pub brand: Option<String>,
    pub fit: Option<String>,
    pub category: Option<String>,
    pub usage_scene: Option<String>,
    pub personal_values: Option<String>,
    pub purchase_info: Option<String>,

    pub color_hue: Option<NumericInput>,
    pub price: Option<NumericInput>,
    pub silhouette_value: Option<NumericInput>,
    pub material_value: Option<NumericInput>,
    pub emotion: Option<NumericInput>,
    pub fit_value: Option<NumericInput>,
    pub values: Option<NumericInput>,

    pub preferences: Option<Preferences>,
}

impl ItemInput {
    pub fn text(&self, field: TextField) -> Option<&str> {
        self.text_slot(field).as_deref()
    }

    pub fn numeric(&self, field: NumericField) -> Option<&NumericInput> {
        match field {
            NumericField::ColorHue => self.color_hue.as_ref(),
            NumericField::Price => self.price.as_ref(),
            NumericField::SilhouetteValue => self.silhouette_value.as_ref(),
            NumericField::MaterialValue => self.material_value.as_ref(),
            NumericField::Emotion => self.emotion.as_ref(),
            NumericField::FitValue => self.fit_value.as_ref(),
            NumericField::Values => self.values.as_ref(),
        }
    }

    /// Builder-style setter for a text field
    pub fn with_text(mut self, field: TextField, value: impl Into<String>) -> Self {
        *self.text_slot_mut(field) = Some(value.into());
        self
    }

    /// Builder-style setter for a numeric field
    pub fn with_numeric(mut self, field: NumericField, value: impl Into<NumericInput>) -> Self {
        let value = Some(value.into());
        match field {
            NumericField::ColorHue => self.color_hue = value,
            NumericField::Price => self.price = value,
            NumericField::SilhouetteValue => self.silhouette_value = value,
            NumericField::MaterialValue => self.material_value = value,
            NumericField::Emotion => self.emotion = value,
            NumericField::FitValue => self.fit_value = value,
            NumericField::Values => self.values = value,
        }
        self
    }

    fn text_slot(&self, field: TextField) -> &Option<String> {
        match field {
            TextField::Name => &self.name,
            TextField::Color => &self.color,
            TextField::Silhouette => &self.silhouette,
            TextField::Material => &self.material,
            TextField::Brand => &self.brand,
            TextField::Fit => &self.fit,
            TextField::Category => &self.category,
            TextField::UsageScene => &self.usage_scene,
            TextField::PersonalValues => &self.personal_values,
            TextField::PurchaseInfo => &self.purchase_info,
        }
    }

    fn text_slot_mut(&mut self, field: TextField) -> &mut Option<String> {
        match field {
            TextField::Name => &mut self.name,
            TextField::Color => &mut self.color,
            TextField::Silhouette => &mut self.silhouette,
            TextField::Material => &mut self.material,
            TextField::Brand => &mut self.brand,
            TextField::Fit => &mut self.fit,
            TextField::Category => &mut self.category,
            TextField::UsageScene => &mut self.usage_scene,
            TextField::PersonalValues => &mut self.personal_values,
            TextField::PurchaseInfo => &mut self.purchase_info,
        }
    }
}

/// Whether the candidate is a new item or a patch to an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

/// Normalized, admitted field set
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedFields {
    /// Every recognized field, defaults filled in where omitted
    pub fields: ItemFields,
    /// Passed-through block (overall recomputed) or freshly derived
    pub preferences: Preferences,
    supplied_text: Vec<TextField>,
    supplied_numeric: Vec<NumericField>,
    preferences_supplied: bool,
}

impl ValidatedFields {
    /// Merge the supplied fields over an existing item. Omitted fields keep
    /// their stored values; the preferences block is rebuilt so `overall`
    /// matches the merged attributes.
    pub fn apply_to(&self, item: &mut ClothingItem) {
        for field in &self.supplied_text {
            *field.get_mut(&mut item.fields) = field.get(&self.fields).to_string();
        }
        for field in &self.supplied_numeric {
            field.set(&mut item.fields, field.get(&self.fields));
        }
        item.preferences = if self.preferences_supplied {
            Preferences {
                overall: schema::overall_preference(&item.fields),
                ..self.preferences
            }
        } else {
            schema::derive_preferences(&item.fields)
        };
    }

    pub fn supplied(&self, field: TextField) -> bool {
        self.supplied_text.contains(&field)
    }
}

/// Check a candidate against the field table.
pub fn validate(input: &ItemInput, mode: Mode) -> Result<ValidatedFields, ValidationError> {
    let mut errors = Vec::new();

    if mode == Mode::Create && input.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
        errors.push("name is required".to_string());
    }

    let mut fields = ItemFields::default();
    let mut supplied_text = Vec::new();
    for field in TextField::ALL {
        let Some(value) = input.text(field) else {
            continue;
        };
        if value.chars().count() > TEXT_MAX_LEN {
            errors.push(format!(
                "{} must be at most {} characters",
                field.key(),
                TEXT_MAX_LEN
            ));
            continue;
        }
        *field.get_mut(&mut fields) = value.to_string();
        supplied_text.push(field);
    }

    let mut supplied_numeric = Vec::new();
    for field in NumericField::ALL {
        let Some(raw) = input.numeric(field) else {
            continue;
        };
        match raw.coerce() {
            Some(value) if field.in_bounds(value) => {
                field.set(&mut fields, value);
                supplied_numeric.push(field);
            }
            _ => errors.push(format!("{} must be a number between 0 and 100", field.key())),
        }
    }

    if !errors.is_empty() {
        return Err(ValidationError::new(errors));
    }

    let preferences = match input.preferences {
        Some(prefs) => Preferences {
            overall: schema::overall_preference(&fields),
            ..prefs
        },
        None => schema::derive_preferences(&fields),
    };

    Ok(ValidatedFields {
        fields,
        preferences,
        supplied_text,
        supplied_numeric,
        preferences_supplied: input.preferences.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn stored_item() -> ClothingItem {
        let mut fields = ItemFields::default();
        fields.name = "Wool coat".to_string();
        fields.brand = "ZARA".to_string();
        fields.price = 80.0;
        ClothingItem {
            id: "item-1".to_string(),
            preferences: schema::derive_preferences(&fields),
            fields,
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
            updated_at: "2024-01-01T00:00:00.000Z".to_string(),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_create_requires_name() {
        let err = validate(&ItemInput::default(), Mode::Create).unwrap_err();
        assert_eq!(err.messages, vec!["name is required".to_string()]);

        let blank = ItemInput::default().with_text(TextField::Name, "   ");
        assert!(validate(&blank, Mode::Create).is_err());
    }

    #[test]
    fn test_update_does_not_require_name() {
        let input = ItemInput::default().with_numeric(NumericField::Emotion, 90.0);
        assert!(validate(&input, Mode::Update).is_ok());
    }

    #[test]
    fn test_all_violations_are_aggregated() {
        let input = ItemInput::default()
            .with_text(TextField::Name, "Tee")
            .with_text(TextField::Brand, "x".repeat(101))
            .with_numeric(NumericField::Price, 150.0)
            .with_numeric(NumericField::Emotion, "lots");

        let err = validate(&input, Mode::Create).unwrap_err();
        assert_eq!(err.messages.len(), 3);
        assert!(err.messages.iter().any(|m| m.starts_with("brand")));
        assert!(err.messages.iter().any(|m| m.starts_with("price")));
        assert!(err.messages.iter().any(|m| m.starts_with("emotion")));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let input = ItemInput::default().with_text(TextField::Name, "あ".repeat(100));
        assert!(validate(&input, Mode::Create).is_ok());
    }

    #[test]
    fn test_numeric_text_is_coerced() {
        let input = ItemInput::default()
            .with_text(TextField::Name, "Tee")
            .with_numeric(NumericField::Price, " 72 ")
            .with_numeric(NumericField::FitValue, "");

        let validated = validate(&input, Mode::Create).unwrap();
        assert_eq!(validated.fields.price, 72.0);
        assert_eq!(validated.fields.fit_value, 0.0);
    }

    #[test]
    fn test_non_finite_rejected() {
        let input = ItemInput::default()
            .with_text(TextField::Name, "Tee")
            .with_numeric(NumericField::Values, f64::NAN);
        assert!(validate(&input, Mode::Create).is_err());
    }

    #[test]
    fn test_defaults_and_derived_preferences() {
        let input = ItemInput::default()
            .with_text(TextField::Name, "Tee")
            .with_numeric(NumericField::ColorHue, 70.0);

        let validated = validate(&input, Mode::Create).unwrap();
        assert_eq!(validated.fields.category, "");
        assert_eq!(validated.fields.material_value, 50.0);
        // (70 + 50 * 6) / 7 = 52.86
        assert_eq!(validated.preferences.overall, 53.0);
        assert_eq!(validated.preferences.color, 70.0);
    }

    #[test]
    fn test_passed_preferences_get_fresh_overall() {
        let mut input = ItemInput::default().with_text(TextField::Name, "Tee");
        input.preferences = Some(Preferences {
            color: 1.0,
            price: 2.0,
            silhouette: 3.0,
            material: 4.0,
            emotion: 5.0,
            fit: 6.0,
            values: 7.0,
            overall: 99.0,
        });

        let validated = validate(&input, Mode::Create).unwrap();
        assert_eq!(validated.preferences.color, 1.0);
        assert_eq!(validated.preferences.overall, 43.0);
    }

    #[test]
    fn test_update_merges_only_supplied_fields() {
        let mut item = stored_item();
        let input = ItemInput::default()
            .with_text(TextField::Color, "navy")
            .with_numeric(NumericField::Emotion, 100.0);

        let validated = validate(&input, Mode::Update).unwrap();
        validated.apply_to(&mut item);

        assert_eq!(item.fields.name, "Wool coat");
        assert_eq!(item.fields.brand, "ZARA");
        assert_eq!(item.fields.price, 80.0);
        assert_eq!(item.fields.color, "navy");
        assert_eq!(item.fields.emotion, 100.0);
        assert_eq!(item.preferences.overall, schema::overall_preference(&item.fields));
        assert!(validated.supplied(TextField::Color));
        assert!(!validated.supplied(TextField::Name));
    }

    #[test]
    fn test_input_deserializes_mixed_numbers() {
        let input: ItemInput = serde_json::from_value(serde_json::json!({
            "name": "Tee",
            "price": 30,
            "emotion": "45",
            "usageScene": "weekend"
        }))
        .unwrap();

        assert_eq!(input.price, Some(NumericInput::Number(30.0)));
        assert_eq!(input.emotion, Some(NumericInput::Text("45".to_string())));
        assert_eq!(input.text(TextField::UsageScene), Some("weekend"));
    }
}
