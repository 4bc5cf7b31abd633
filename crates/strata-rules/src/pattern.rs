//! Regular-expression file matcher used by `test` conditions.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, RuleError};

/// A compiled file-name pattern.
///
/// Two patterns are equal when their source text is equal, which is how the
/// bundler compares them as well. Serialized as `{"pattern": "<source>"}`.
#[derive(Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern from its source text.
    ///
    /// # Example
    ///
    /// ```
    /// use strata_rules::Pattern;
    ///
    /// let css = Pattern::new(r"\.css$").unwrap();
    /// assert!(css.is_match("src/app.css"));
    /// assert!(!css.is_match("src/app.js"));
    /// ```
    pub fn new(source: &str) -> Result<Self> {
        Regex::new(source)
            .map(|regex| Self { regex })
            .map_err(|err| RuleError::InvalidPattern {
                source_text: source.to_string(),
                message: err.to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, resource: &str) -> bool {
        self.regex.is_match(resource)
    }
}

impl FromStr for Pattern {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Pattern {}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.as_str())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.as_str())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PatternRepr {
    pattern: String,
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        PatternRepr {
            pattern: self.as_str().to_string(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let repr = PatternRepr::deserialize(deserializer)?;
        Pattern::new(&repr.pattern).map_err(serde::de::Error::custom)
    }
}
