//! ============================================================================
//! Statistics - Aggregates recomputed from the collection
//! ============================================================================

use std::collections::BTreeMap;

use crate::types::{ClothingItem, PriceRange, Statistics};

/// Recompute every aggregate from scratch.
pub fn compute(items: &[ClothingItem]) -> Statistics {
    if items.is_empty() {
        return Statistics::default();
    }

    let count = items.len() as f64;
    let overall_sum: f64 = items.iter().map(|item| item.preferences.overall).sum();

    // Insertion order decides ties for the favorite
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for item in items {
        let category = item.fields.category.as_str();
        if category.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(name, _)| *name == category) {
            Some((_, n)) => *n += 1,
            None => counts.push((category, 1)),
        }
    }

    let mut favorite: Option<(&str, usize)> = None;
    for &(name, n) in &counts {
        if favorite.map_or(true, |(_, best)| n > best) {
            favorite = Some((name, n));
        }
    }

    let category_distribution: BTreeMap<String, usize> = counts
        .iter()
        .map(|(name, n)| (name.to_string(), *n))
        .collect();

    let prices = items.iter().map(|item| item.fields.price);
    let min = prices.clone().fold(f64::INFINITY, f64::min);
    let max = prices.clone().fold(f64::NEG_INFINITY, f64::max);
    let average = (prices.sum::<f64>() / count).round();

    Statistics {
        total_items: items.len(),
        average_preference: (overall_sum / count).round(),
        favorite_category: favorite.map(|(name, _)| name.to_string()),
        category_distribution,
        price_range: PriceRange { min, max, average },
    }
}

/// Display tone for the average preference figure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceTone {
    Positive,
    Neutral,
    Negative,
}

impl PreferenceTone {
    pub const POSITIVE_ABOVE: f64 = 50.0;
    /// Unreachable while `overall` stays clamped to 0-100
    pub const NEGATIVE_BELOW: f64 = 0.0;

    pub fn classify(average_preference: f64) -> Self {
        if average_preference > Self::POSITIVE_ABOVE {
            PreferenceTone::Positive
        } else if average_preference < Self::NEGATIVE_BELOW {
            PreferenceTone::Negative
        } else {
            PreferenceTone::Neutral
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PreferenceTone::Positive => "positive",
            PreferenceTone::Neutral => "neutral",
            PreferenceTone::Negative => "negative",
        }
    }
}
