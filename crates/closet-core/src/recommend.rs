//! ============================================================================
//! Recommendation Synthesizer - Catalog picks driven by the user's averages
//! ============================================================================
//! There is no model here: the preference profile selects a catalog list,
//! the template is chosen round-robin by index, the price is scaled by the
//! profile's price preference, and the match score is a bounded random
//! draw. Any arithmetic that goes off the rails yields the fixed default
//! item for that slot instead of an error.
//! ============================================================================

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::ClothingItem;

// ============================================================================
// Catalog
// ============================================================================

/// One fixed catalog entry
#[derive(Debug, Clone, Copy)]
struct Template {
    name: &'static str,
    brand: &'static str,
    base_price: u64,
}

const fn t(name: &'static str, brand: &'static str, base_price: u64) -> Template {
    Template { name, brand, base_price }
}

const TOPS: &[Template] = &[
    t("ベーシックTシャツ", "UNIQLO", 1500),
    t("カジュアルシャツ", "GU", 2500),
    t("ニットセーター", "ZARA", 4500),
];
const BOTTOMS: &[Template] = &[
    t("デニムパンツ", "UNIQLO", 3900),
    t("チノパンツ", "GU", 2900),
    t("スカート", "ZARA", 5900),
];
const OUTERWEAR: &[Template] = &[
    t("デニムジャケット", "UNIQLO", 4900),
    t("カーディガン", "GU", 3500),
    t("トレンチコート", "ZARA", 12900),
];
const SHOES: &[Template] = &[
    t("スニーカー", "CONVERSE", 8500),
    t("ローファー", "UNIQLO", 3900),
    t("ブーツ", "ZARA", 9900),
];
const ACCESSORIES: &[Template] = &[
    t("トートバッグ", "UNIQLO", 1500),
    t("ベルト", "GU", 1900),
    t("帽子", "ZARA", 2900),
];

/// Template list for a category; anything unlisted gets the tops list
fn templates_for(category: &str) -> &'static [Template] {
    match category {
        "tops" => TOPS,
        "bottoms" => BOTTOMS,
        "outerwear" => OUTERWEAR,
        "shoes" => SHOES,
        "accessories" => ACCESSORIES,
        _ => TOPS,
    }
}

/// Fallback entries, cycled by index
const DEFAULT_ITEMS: [(Template, &str); 3] = [
    (t("ベーシックTシャツ", "UNIQLO", 1500), "tops"),
    (t("デニムパンツ", "UNIQLO", 3900), "bottoms"),
    (t("デニムジャケット", "UNIQLO", 4900), "outerwear"),
];

const DEFAULT_MATCH_SCORE: u8 = 75;
const DEFAULT_COLOR_NAME: &str = "ブルー";
const MATCH_SCORE_RANGE: std::ops::Range<u8> = 70..100;

// ============================================================================
// Preference profile
// ============================================================================

/// Per-field averages across the collection plus the majority category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceProfile {
    pub color_hue: f64,
    pub price: f64,
    pub silhouette_value: f64,
    pub material_value: f64,
    pub emotion: f64,
    pub fit_value: f64,
    pub values: f64,
    pub favorite_category: String,
}

impl Default for PreferenceProfile {
    fn default() -> Self {
        Self {
            color_hue: 180.0,
            price: 50.0,
            silhouette_value: 50.0,
            material_value: 50.0,
            emotion: 50.0,
            fit_value: 50.0,
            values: 50.0,
            favorite_category: "tops".to_string(),
        }
    }
}

impl PreferenceProfile {
    /// Category vote cast by items that have none
    pub const UNCATEGORIZED: &'static str = "other";

    /// Average the collection. An empty collection gets the default profile.
    pub fn from_items(items: &[ClothingItem]) -> Self {
        if items.is_empty() {
            return Self::default();
        }

        let n = items.len() as f64;
        let mean = |get: fn(&ClothingItem) -> f64| (items.iter().map(get).sum::<f64>() / n).round();

        let mut votes: Vec<(&str, usize)> = Vec::new();
        for item in items {
            let category = match item.fields.category.as_str() {
                "" => Self::UNCATEGORIZED,
                c => c,
            };
            match votes.iter_mut().find(|(c, _)| *c == category) {
                Some((_, count)) => *count += 1,
                None => votes.push((category, 1)),
            }
        }
        let mut favorite = votes[0];
        for &vote in &votes[1..] {
            if vote.1 > favorite.1 {
                favorite = vote;
            }
        }

        Self {
            color_hue: mean(|i| i.fields.color_hue),
            price: mean(|i| i.fields.price),
            silhouette_value: mean(|i| i.fields.silhouette_value),
            material_value: mean(|i| i.fields.material_value),
            emotion: mean(|i| i.fields.emotion),
            fit_value: mean(|i| i.fields.fit_value),
            values: mean(|i| i.fields.values),
            favorite_category: favorite.0.to_string(),
        }
    }
}

// ============================================================================
// Recommendation output
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceBand {
    Low,
    Mid,
    High,
}

impl PriceBand {
    pub fn from_price(price: u64) -> Self {
        if price < 2000 {
            PriceBand::Low
        } else if price < 5000 {
            PriceBand::Mid
        } else {
            PriceBand::High
        }
    }

    /// Label shown next to the price
    pub fn label(self) -> &'static str {
        match self {
            PriceBand::Low => "低価格",
            PriceBand::Mid => "中価格",
            PriceBand::High => "高価格",
        }
    }
}

/// A synthesized suggestion. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationItem {
    pub id: String,
    pub name: String,
    pub brand: String,
    /// Yen, integer
    pub price: u64,
    pub price_display: String,
    pub price_range: PriceBand,
    pub category: String,
    pub category_display: String,
    pub url: String,
    pub description: String,
    pub color_hue: f64,
    pub color_name: String,
    pub match_score: u8,
    pub preferences: PreferenceProfile,
}

/// Display name for a category key; blank reads as "other"
pub fn category_display_name(category: &str) -> String {
    if category.is_empty() {
        return "その他".to_string();
    }
    let name = match category.to_lowercase().as_str() {
        "tops" => "トップス",
        "bottoms" => "ボトムス",
        "outerwear" => "アウター",
        "dresses" => "ワンピース",
        "shoes" => "靴",
        "accessories" => "アクセサリー",
        "underwear" => "下着",
        "sportswear" => "スポーツウェア",
        "formal" => "フォーマル",
        "casual" => "カジュアル",
        _ => return category.to_string(),
    };
    name.to_string()
}

const HUE_ANCHORS: [(f64, &str); 12] = [
    (0.0, "レッド"),
    (30.0, "オレンジ"),
    (60.0, "イエロー"),
    (90.0, "ライム"),
    (120.0, "グリーン"),
    (150.0, "ティール"),
    (180.0, "シアン"),
    (210.0, "ブルー"),
    (240.0, "インディゴ"),
    (270.0, "パープル"),
    (300.0, "マゼンタ"),
    (330.0, "ピンク"),
];

/// Nearest hue anchor by plain distance (no wrap at 360). On a tie the
/// earlier anchor wins.
pub fn color_name(hue: f64) -> &'static str {
    let mut best = HUE_ANCHORS[0];
    for anchor in &HUE_ANCHORS[1..] {
        if (anchor.0 - hue).abs() < (best.0 - hue).abs() {
            best = *anchor;
        }
    }
    best.1
}

/// `¥12,900` style
pub fn format_yen(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('¥');
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Fixed item used when the collection is empty or synthesis fails
pub fn default_recommendation(index: usize) -> RecommendationItem {
    let (template, category) = DEFAULT_ITEMS[index % DEFAULT_ITEMS.len()];
    let display = category_display_name(category);
    let profile = PreferenceProfile::default();
    RecommendationItem {
        id: format!("rec_default_{}", index),
        name: template.name.to_string(),
        brand: template.brand.to_string(),
        price: template.base_price,
        price_display: format_yen(template.base_price),
        price_range: PriceBand::Mid,
        category: category.to_string(),
        url: format!("https://example.com/product/default_{}", index),
        description: format!("{}のおすすめ商品です。", display),
        category_display: display,
        color_hue: profile.color_hue,
        color_name: DEFAULT_COLOR_NAME.to_string(),
        match_score: DEFAULT_MATCH_SCORE,
        preferences: profile,
    }
}

/// Build the recommendation for slot `index`. `stamp` is the millisecond
/// timestamp embedded in the id.
pub fn synthesize<R: Rng + ?Sized>(
    profile: &PreferenceProfile,
    index: usize,
    stamp: i64,
    rng: &mut R,
) -> RecommendationItem {
    match try_synthesize(profile, index, stamp, rng) {
        Some(item) => item,
        None => {
            warn!("Recommendation {} could not be synthesized, using default", index);
            default_recommendation(index)
        }
    }
}

/// Upper bound on a scaled price before it is treated as garbage
const MAX_PRICE: f64 = 1e12;

fn try_synthesize<R: Rng + ?Sized>(
    profile: &PreferenceProfile,
    index: usize,
    stamp: i64,
    rng: &mut R,
) -> Option<RecommendationItem> {
    let category = profile.favorite_category.as_str();
    let templates = templates_for(category);
    let template = templates.get(index % templates.len().max(1))?;

    let scaled = (template.base_price as f64 * profile.price / 50.0).round();
    if !scaled.is_finite() || !(0.0..MAX_PRICE).contains(&scaled) {
        return None;
    }
    let price = scaled as u64;

    if !profile.color_hue.is_finite() {
        return None;
    }

    let display = category_display_name(category);
    Some(RecommendationItem {
        id: format!("rec_{}_{}", stamp, index),
        name: template.name.to_string(),
        brand: template.brand.to_string(),
        price,
        price_display: format_yen(price),
        price_range: PriceBand::from_price(price),
        category: category.to_string(),
        url: format!("https://example.com/product/{}", index),
        description: format!(
            "{}のおすすめ商品です。あなたの好みに基づいて選ばれました。",
            display
        ),
        category_display: display,
        color_hue: profile.color_hue,
        color_name: color_name(profile.color_hue).to_string(),
        match_score: rng.gen_range(MATCH_SCORE_RANGE),
        preferences: profile.clone(),
    })
}

/// `count` recommendations for the collection. Empty collections get the
/// default catalog.
pub fn generate<R: Rng + ?Sized>(
    items: &[ClothingItem],
    count: usize,
    stamp: i64,
    rng: &mut R,
) -> Vec<RecommendationItem> {
    if items.is_empty() {
        return (0..count).map(default_recommendation).collect();
    }
    let profile = PreferenceProfile::from_items(items);
    (0..count)
        .map(|index| synthesize(&profile, index, stamp, rng))
        .collect()
}
