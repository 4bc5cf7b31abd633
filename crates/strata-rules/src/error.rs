//! Error types for rule conversion and pattern compilation.

use thiserror::Error;

use crate::convert::ALLOWED_PROPERTIES;

pub type Result<T> = std::result::Result<T, RuleError>;

#[derive(Debug, Error)]
pub enum RuleError {
    /// A rule handed to a library registration carries exclusionary semantics.
    #[error(
        "rules added by a library cannot contain the property \"{property}\"; \
         try to reformulate the rule with {allowed}",
        allowed = ALLOWED_PROPERTIES.join("/")
    )]
    UnsupportedCondition { property: &'static str },

    #[error("invalid pattern `{source_text}`: {message}")]
    InvalidPattern {
        source_text: String,
        message: String,
    },
}

impl RuleError {
    /// Name of the offending rule property, if this is a conversion failure.
    pub fn property(&self) -> Option<&'static str> {
        match self {
            Self::UnsupportedCondition { property } => Some(property),
            Self::InvalidPattern { .. } => None,
        }
    }
}
