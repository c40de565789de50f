//! ============================================================================
//! Query - Search filters and the sort comparator
//! ============================================================================

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{self, Field, TextField};
use crate::types::ClothingItem;

/// Optional narrowing applied after the text match. Filters are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFilters {
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_preference: Option<f64>,
}

impl SearchFilters {
    fn accepts(&self, item: &ClothingItem) -> bool {
        if let Some(category) = self.category.as_deref() {
            if item.fields.category != category {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if item.fields.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if item.fields.price > max {
                return false;
            }
        }
        if let Some(min) = self.min_preference {
            if item.preferences.overall < min {
                return false;
            }
        }
        true
    }
}

/// Fields the free-text query is matched against
const SEARCHED_FIELDS: [TextField; 4] = [
    TextField::Name,
    TextField::Color,
    TextField::Brand,
    TextField::Category,
];

/// Case-insensitive substring match on name/color/brand/category, then
/// the filters. A blank query matches everything.
pub fn search(items: &[ClothingItem], query: &str, filters: &SearchFilters) -> Vec<ClothingItem> {
    let needle = (!query.trim().is_empty()).then(|| query.to_lowercase());

    items
        .iter()
        .filter(|item| match &needle {
            Some(needle) => SEARCHED_FIELDS
                .iter()
                .any(|field| field.get(&item.fields).to_lowercase().contains(needle.as_str())),
            None => true,
        })
        .filter(|item| filters.accepts(item))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{}', expected asc or desc", other)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

/// Default sort key when the caller names none
pub const DEFAULT_SORT_FIELD: &str = "createdAt";

/// Sorted copy of `items`. Stable: equal elements keep their input order
/// in both directions.
pub fn sort_items(items: &[ClothingItem], field: &str, order: SortOrder) -> Vec<ClothingItem> {
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = compare_by(a, b, field);
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
    sorted
}

fn compare_by(a: &ClothingItem, b: &ClothingItem, field: &str) -> Ordering {
    match field {
        "createdAt" => compare_timestamps(&a.created_at, &b.created_at),
        "updatedAt" => compare_timestamps(&a.updated_at, &b.updated_at),
        "id" => locale_compare(&a.id, &b.id),
        _ => match schema::lookup(field) {
            Some(Field::Text(f)) => locale_compare(f.get(&a.fields), f.get(&b.fields)),
            Some(Field::Numeric(f)) => compare_numbers(f.get(&a.fields), f.get(&b.fields)),
            None => compare_extra(a.extra.get(field), b.extra.get(field)),
        },
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).ok()
}

/// Unparseable timestamps compare equal to anything
fn compare_timestamps(a: &str, b: &str) -> Ordering {
    match (parse_timestamp(a), parse_timestamp(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => Ordering::Equal,
    }
}

fn compare_numbers(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Case-folded comparison, falling back to code-point order between
/// strings that differ only in case.
fn locale_compare(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn compare_extra(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => locale_compare(a, b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => compare_numbers(a, b),
            _ => Ordering::Equal,
        },
        _ => Ordering::Equal,
    }
}
