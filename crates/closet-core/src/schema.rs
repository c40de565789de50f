//! ============================================================================
//! Field Schema - The fixed table of item attributes
//! ============================================================================
//! Validator, migrator and staged-record converter all walk these tables,
//! so adding a field here is the only change needed to teach all three.
//! ============================================================================

use crate::types::{ItemFields, Preferences};

/// Maximum length (in characters) of any free-text field
pub const TEXT_MAX_LEN: usize = 100;

/// Inclusive bounds enforced on numeric attributes at validation time
pub const NUMERIC_MIN: f64 = 0.0;
pub const NUMERIC_MAX: f64 = 100.0;

/// Free-text attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    Name,
    Color,
    Silhouette,
    Material,
    Brand,
    Fit,
    Category,
    UsageScene,
    PersonalValues,
    PurchaseInfo,
}

impl TextField {
    pub const ALL: [TextField; 10] = [
        TextField::Name,
        TextField::Color,
        TextField::Silhouette,
        TextField::Material,
        TextField::Brand,
        TextField::Fit,
        TextField::Category,
        TextField::UsageScene,
        TextField::PersonalValues,
        TextField::PurchaseInfo,
    ];

    /// JSON key in the persisted item
    pub fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Color => "color",
            Self::Silhouette => "silhouette",
            Self::Material => "material",
            Self::Brand => "brand",
            Self::Fit => "fit",
            Self::Category => "category",
            Self::UsageScene => "usageScene",
            Self::PersonalValues => "personalValues",
            Self::PurchaseInfo => "purchaseInfo",
        }
    }

    /// Table label used by the entry flow's staged records
    pub fn staged_label(self) -> &'static str {
        match self {
            Self::Name => "商品名",
            Self::Color => "配色",
            Self::Silhouette => "シルエット",
            Self::Material => "素材感",
            Self::Brand => "ブランド/値段",
            Self::Fit => "フィット感",
            Self::Category => "カテゴリ",
            Self::UsageScene => "使用シーン",
            Self::PersonalValues => "個人的な価値観・こだわり",
            Self::PurchaseInfo => "購入日/URL",
        }
    }

    pub fn get(self, fields: &ItemFields) -> &str {
        match self {
            Self::Name => &fields.name,
            Self::Color => &fields.color,
            Self::Silhouette => &fields.silhouette,
            Self::Material => &fields.material,
            Self::Brand => &fields.brand,
            Self::Fit => &fields.fit,
            Self::Category => &fields.category,
            Self::UsageScene => &fields.usage_scene,
            Self::PersonalValues => &fields.personal_values,
            Self::PurchaseInfo => &fields.purchase_info,
        }
    }

    pub fn get_mut(self, fields: &mut ItemFields) -> &mut String {
        match self {
            Self::Name => &mut fields.name,
            Self::Color => &mut fields.color,
            Self::Silhouette => &mut fields.silhouette,
            Self::Material => &mut fields.material,
            Self::Brand => &mut fields.brand,
            Self::Fit => &mut fields.fit,
            Self::Category => &mut fields.category,
            Self::UsageScene => &mut fields.usage_scene,
            Self::PersonalValues => &mut fields.personal_values,
            Self::PurchaseInfo => &mut fields.purchase_info,
        }
    }
}

/// Slider-driven numeric attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    ColorHue,
    Price,
    SilhouetteValue,
    MaterialValue,
    Emotion,
    FitValue,
    Values,
}

impl NumericField {
    pub const ALL: [NumericField; 7] = [
        NumericField::ColorHue,
        NumericField::Price,
        NumericField::SilhouetteValue,
        NumericField::MaterialValue,
        NumericField::Emotion,
        NumericField::FitValue,
        NumericField::Values,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::ColorHue => "colorHue",
            Self::Price => "price",
            Self::SilhouetteValue => "silhouetteValue",
            Self::MaterialValue => "materialValue",
            Self::Emotion => "emotion",
            Self::FitValue => "fitValue",
            Self::Values => "values",
        }
    }

    /// Slider element id used by the entry flow
    pub fn slider_key(self) -> &'static str {
        match self {
            Self::ColorHue => "colorSlider",
            Self::Price => "priceSlider",
            Self::SilhouetteValue => "silhouetteSlider",
            Self::MaterialValue => "materialSlider",
            Self::Emotion => "emotionSlider",
            Self::FitValue => "fitSlider",
            Self::Values => "valuesSlider",
        }
    }

    /// Key of the matching axis inside the `preferences` block
    pub fn preference_key(self) -> &'static str {
        match self {
            Self::ColorHue => "color",
            Self::Price => "price",
            Self::SilhouetteValue => "silhouette",
            Self::MaterialValue => "material",
            Self::Emotion => "emotion",
            Self::FitValue => "fit",
            Self::Values => "values",
        }
    }

    pub fn default_value(self) -> f64 {
        match self {
            Self::ColorHue => 0.0,
            _ => 50.0,
        }
    }

    pub fn in_bounds(self, value: f64) -> bool {
        value.is_finite() && (NUMERIC_MIN..=NUMERIC_MAX).contains(&value)
    }

    pub fn get(self, fields: &ItemFields) -> f64 {
        match self {
            Self::ColorHue => fields.color_hue,
            Self::Price => fields.price,
            Self::SilhouetteValue => fields.silhouette_value,
            Self::MaterialValue => fields.material_value,
            Self::Emotion => fields.emotion,
            Self::FitValue => fields.fit_value,
            Self::Values => fields.values,
        }
    }

    pub fn set(self, fields: &mut ItemFields, value: f64) {
        match self {
            Self::ColorHue => fields.color_hue = value,
            Self::Price => fields.price = value,
            Self::SilhouetteValue => fields.silhouette_value = value,
            Self::MaterialValue => fields.material_value = value,
            Self::Emotion => fields.emotion = value,
            Self::FitValue => fields.fit_value = value,
            Self::Values => fields.values = value,
        }
    }

    pub fn set_axis(self, prefs: &mut Preferences, value: f64) {
        match self {
            Self::ColorHue => prefs.color = value,
            Self::Price => prefs.price = value,
            Self::SilhouetteValue => prefs.silhouette = value,
            Self::MaterialValue => prefs.material = value,
            Self::Emotion => prefs.emotion = value,
            Self::FitValue => prefs.fit = value,
            Self::Values => prefs.values = value,
        }
    }
}

/// Any recognized attribute, looked up by its JSON key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Text(TextField),
    Numeric(NumericField),
}

pub fn lookup(key: &str) -> Option<Field> {
    TextField::ALL
        .iter()
        .find(|f| f.key() == key)
        .map(|f| Field::Text(*f))
        .or_else(|| {
            NumericField::ALL
                .iter()
                .find(|f| f.key() == key)
                .map(|f| Field::Numeric(*f))
        })
}

/// Rounded mean of the seven numeric attributes, clamped to 0-100
pub fn overall_preference(fields: &ItemFields) -> f64 {
    let sum: f64 = NumericField::ALL.iter().map(|f| f.get(fields)).sum();
    let average = sum / NumericField::ALL.len() as f64;
    average.clamp(NUMERIC_MIN, NUMERIC_MAX).round()
}

/// Build the `preferences` snapshot from the flat numeric attributes
pub fn derive_preferences(fields: &ItemFields) -> Preferences {
    let mut prefs = Preferences {
        color: 0.0,
        price: 0.0,
        silhouette: 0.0,
        material: 0.0,
        emotion: 0.0,
        fit: 0.0,
        values: 0.0,
        overall: overall_preference(fields),
    };
    for field in NumericField::ALL {
        field.set_axis(&mut prefs, field.get(fields));
    }
    prefs
}
