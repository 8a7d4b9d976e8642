use serde::{Deserialize, Serialize};

pub const DEFAULT_DIETARY_PREFERENCE: &str = "Balanced";
pub const DEFAULT_HEALTH_GOAL: &str = "Weight Management";

// ---------------------------------------------------------------------------
// UserPreferences — written at onboarding, read thereafter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub dietary_preference: String,
    pub health_goal: String,
    #[serde(default)]
    pub allergens: Vec<String>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            dietary_preference: DEFAULT_DIETARY_PREFERENCE.to_string(),
            health_goal: DEFAULT_HEALTH_GOAL.to_string(),
            allergens: Vec::new(),
        }
    }
}

impl UserPreferences {
    /// Case-insensitive match of a product allergen against the user's set.
    pub fn is_allergic_to(&self, allergen: &str) -> bool {
        self.allergens
            .iter()
            .any(|a| a.eq_ignore_ascii_case(allergen))
    }
}
