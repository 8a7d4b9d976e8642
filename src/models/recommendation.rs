use serde::{Deserialize, Serialize};
use std::fmt;

use super::product::ProductRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Healthier,
    Similar,
    Alternative,
}

impl RecommendationKind {
    /// All kinds, in the order recommendations are presented.
    pub const ALL: [RecommendationKind; 3] = [
        RecommendationKind::Healthier,
        RecommendationKind::Similar,
        RecommendationKind::Alternative,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecommendationKind::Healthier => "healthier",
            RecommendationKind::Similar => "similar",
            RecommendationKind::Alternative => "alternative",
        }
    }
}

impl fmt::Display for RecommendationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Recommendation — derived, never persisted
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub product: ProductRecord,
    pub reason: String,
}
