//! Error types for composing a build configuration.

use strata_rules::RuleError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ComposeError>;

#[derive(Debug, Error)]
pub enum ComposeError {
    /// Malformed input to a setter or registration call.
    #[error("invalid argument to {operation}(): {message}")]
    InvalidArgument {
        operation: &'static str,
        message: String,
    },

    /// A library-only operation was called with no library registration active.
    #[error(
        "{operation}() must be called from within a library. \
         To add it to your project, add it to your bundler configuration directly. \
         If you are calling this from a library, make sure it was registered with `add_library()` first."
    )]
    ScopeViolation { operation: &'static str },

    #[error(transparent)]
    UnsupportedCondition(RuleError),

    #[error("apply() was already called on this composer; build a new composer for each configuration")]
    AlreadyApplied,

    #[error("library `{name}` failed to configure: {source}")]
    Library {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("plugin `{name}` failed: {source}")]
    Plugin {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid settings: {0}")]
    Settings(String),

    #[error("invalid bundler configuration: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ComposeError {
    /// Wrap a failure raised by a library's own configuration code.
    pub fn library(name: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Library {
            name: name.into(),
            source: source.into(),
        }
    }
}

impl From<RuleError> for ComposeError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::UnsupportedCondition { .. } => Self::UnsupportedCondition(err),
            RuleError::InvalidPattern { .. } => Self::InvalidArgument {
                operation: "compile_pattern",
                message: err.to_string(),
            },
        }
    }
}
