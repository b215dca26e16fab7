//! Character domains used when injecting characters into field values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::domain::{
    ALPHA, ALPHANUMERIC, DIGITS, LABEL_ALPHA, LABEL_ALPHANUMERIC, LABEL_DIGIT,
};
use crate::errors::GeneratorError;

/// Closed set of character categories a field may declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharRange {
    /// `0-9`
    Digit,
    /// `a-z`
    Alpha,
    /// `0-9` followed by `a-z`
    Alphanumeric,
}

impl CharRange {
    /// Ordered alphabet usable for insertion.
    pub fn alphabet(self) -> &'static [char] {
        match self {
            CharRange::Digit => DIGITS,
            CharRange::Alpha => ALPHA,
            CharRange::Alphanumeric => ALPHANUMERIC,
        }
    }

    /// Label used in configuration (`digit`, `alpha`, `alphanumeric`).
    pub fn as_str(self) -> &'static str {
        match self {
            CharRange::Digit => LABEL_DIGIT,
            CharRange::Alpha => LABEL_ALPHA,
            CharRange::Alphanumeric => LABEL_ALPHANUMERIC,
        }
    }

    /// Resolve a declared category for `field`, surfacing unknown labels instead of defaulting.
    pub fn resolve(field: &str, category: &str) -> Result<Self, GeneratorError> {
        category
            .parse::<CharRange>()
            .map_err(|_| GeneratorError::UnknownDomain {
                field: field.to_string(),
                category: category.to_string(),
            })
    }
}

impl fmt::Display for CharRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CharRange {
    type Err = GeneratorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            LABEL_DIGIT => Ok(CharRange::Digit),
            LABEL_ALPHA => Ok(CharRange::Alpha),
            LABEL_ALPHANUMERIC => Ok(CharRange::Alphanumeric),
            other => Err(GeneratorError::UnknownDomain {
                field: String::new(),
                category: other.to_string(),
            }),
        }
    }
}
