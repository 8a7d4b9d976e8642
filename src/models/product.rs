use serde::{Deserialize, Serialize};

use crate::error::{FoodGradeError, Result};
use crate::identifier::Identifier;

/// Image shown when a product carries no image reference.
pub const DEFAULT_IMAGE: &str = "/assets/images/default-product.jpg";
/// Nutrition grade reported when the source did not provide one.
pub const UNKNOWN_NUTRITION_GRADE: &str = "unknown";

// ---------------------------------------------------------------------------
// Nutrition — per-100g values, all non-negative
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Nutrition {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default)]
    pub sugars: f64,
    #[serde(default)]
    pub saturated_fat: f64,
}

// ---------------------------------------------------------------------------
// Sustainability
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Sustainability {
    pub carbon_footprint: f64,
    pub packaging_score: f64,
    pub water_usage: f64,
    /// 0 to 100.
    pub eco_score: u8,
}

// ---------------------------------------------------------------------------
// ProcessingLevel — NOVA-style 1 (unprocessed) to 4 (ultra-processed)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ProcessingLevel(u8);

impl ProcessingLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;

    pub fn new(level: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&level).then_some(Self(level))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for ProcessingLevel {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        ProcessingLevel::new(value).ok_or_else(|| {
            format!(
                "processing level {value} outside {}..={}",
                ProcessingLevel::MIN,
                ProcessingLevel::MAX
            )
        })
    }
}

impl From<ProcessingLevel> for u8 {
    fn from(level: ProcessingLevel) -> Self {
        level.0
    }
}

// ---------------------------------------------------------------------------
// ProductRecord — the resolved product
// ---------------------------------------------------------------------------

/// Full description of a product, keyed by its barcode.
///
/// Optional fields default as follows when absent: `image_url` falls back to
/// [`DEFAULT_IMAGE`] via [`ProductRecord::image`], `allergens` and `labels`
/// are empty, `nutrition_grade` reads as [`UNKNOWN_NUTRITION_GRADE`] via
/// [`ProductRecord::nutrition_grade`]. The remaining options stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub barcode: Identifier,
    pub name: String,
    pub brand: String,
    /// Letter grade, optionally suffixed (`"A"`, `"A-"`).
    pub grade: String,
    pub nutrition: Nutrition,
    pub sustainability: Sustainability,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_level: Option<ProcessingLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packaging: Option<String>,
    #[serde(default, rename = "nutritionGrade", skip_serializing_if = "Option::is_none")]
    pub nutrition_grade_raw: Option<String>,
    /// Epoch milliseconds of the last cache write; only set on stored copies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_at: Option<i64>,
}

impl ProductRecord {
    pub fn image(&self) -> &str {
        self.image_url.as_deref().unwrap_or(DEFAULT_IMAGE)
    }

    pub fn nutrition_grade(&self) -> &str {
        self.nutrition_grade_raw
            .as_deref()
            .unwrap_or(UNKNOWN_NUTRITION_GRADE)
    }

    /// Same record with the cache timestamp cleared, for comparing content.
    pub fn without_cache_stamp(&self) -> Self {
        Self {
            cached_at: None,
            ..self.clone()
        }
    }

    /// Check the numeric invariants a record must satisfy before it is cached.
    pub fn validate(&self) -> Result<()> {
        let n = &self.nutrition;
        let nutrition = [
            ("calories", n.calories),
            ("protein", n.protein),
            ("carbs", n.carbs),
            ("fat", n.fat),
            ("sugars", n.sugars),
            ("saturatedFat", n.saturated_fat),
        ];
        for (field, value) in nutrition {
            if !value.is_finite() || value < 0.0 {
                return Err(FoodGradeError::TransportError(format!(
                    "product {} has invalid {field}: {value}",
                    self.barcode
                )));
            }
        }
        if self.sustainability.eco_score > 100 {
            return Err(FoodGradeError::TransportError(format!(
                "product {} has eco score {} above 100",
                self.barcode, self.sustainability.eco_score
            )));
        }
        if !is_grade_token(&self.grade) {
            return Err(FoodGradeError::TransportError(format!(
                "product {} has malformed grade {:?}",
                self.barcode, self.grade
            )));
        }
        Ok(())
    }
}

/// A single letter, optionally followed by `+` or `-`.
fn is_grade_token(grade: &str) -> bool {
    let mut chars = grade.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(letter), None, None) => letter.is_ascii_alphabetic(),
        (Some(letter), Some(sign), None) => {
            letter.is_ascii_alphabetic() && (sign == '-' || sign == '+')
        }
        _ => false,
    }
}
