//! Product barcode identifiers.
//!
//! An [`Identifier`] can only be constructed through validation, so any
//! function accepting one may assume it is exactly 13 ASCII digits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::IDENTIFIER_LENGTH;
use crate::error::{FoodGradeError, Result};

/// A validated 13-digit product barcode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Validate raw input (manual entry or a decoded payload).
    ///
    /// Surrounding whitespace is trimmed. Empty input and anything that is
    /// not exactly 13 ASCII digits is rejected with
    /// [`FoodGradeError::InvalidIdentifier`].
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FoodGradeError::InvalidIdentifier(
                "Please enter a barcode".to_string(),
            ));
        }
        if !is_valid(trimmed) {
            return Err(FoodGradeError::InvalidIdentifier(format!(
                "Barcode must be {IDENTIFIER_LENGTH} digits"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Whether `candidate` matches `^\d{13}$` without trimming.
pub fn is_valid(candidate: &str) -> bool {
    candidate.len() == IDENTIFIER_LENGTH && candidate.bytes().all(|b| b.is_ascii_digit())
}

impl FromStr for Identifier {
    type Err = FoodGradeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = FoodGradeError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Identifier::parse(&raw).map_err(serde::de::Error::custom)
    }
}
