//! Composer settings.
//!
//! Priority: environment variables > `strata.toml` > defaults.

use std::path::Path;

use figment::{
    providers::{Env, Format as _, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{ComposeError, Result};
use crate::provider::ProviderOptions;

/// Default settings file, looked up in the working directory.
pub const SETTINGS_FILE: &str = "strata.toml";

/// Environment prefix; nested keys are separated by `__`
/// (e.g. `STRATA_PROVIDER__INCLUDE_BABEL_RUNTIME=false`).
pub const ENV_PREFIX: &str = "STRATA_";

/// Default `test` of the generated transform rule.
pub const DEFAULT_TRANSFORM_RULE_TEST: &str = r"\.jsx$";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerSettings {
    /// Add the transform rule for source files
    pub transform_rule: bool,

    /// Put the parallel-compile stage in front of the transform stage
    pub parallel_compilation: bool,

    pub source_maps: bool,

    /// Pattern source for the transform rule's `test`
    pub transform_rule_test: String,

    /// Pattern sources excluded from the transform rule
    pub transform_excludes: Vec<String>,

    pub provider: ProviderOptions,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self {
            transform_rule: true,
            parallel_compilation: true,
            source_maps: true,
            transform_rule_test: DEFAULT_TRANSFORM_RULE_TEST.to_string(),
            transform_excludes: Vec::new(),
            provider: ProviderOptions::default(),
        }
    }
}

impl ComposerSettings {
    /// Load settings from defaults, a settings file and the environment.
    ///
    /// `path` overrides the default `strata.toml` lookup. A missing file is
    /// not an error; the defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let settings_file = path.map(Path::to_path_buf).or_else(|| {
            let default_path = Path::new(SETTINGS_FILE);
            default_path.exists().then(|| default_path.to_path_buf())
        });

        if let Some(file) = settings_file {
            tracing::debug!(path = %file.display(), "loading composer settings");
            figment = figment.merge(Toml::file(file));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        Self::from_figment(figment)
    }

    /// Extract settings from a caller-assembled figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        figment
            .extract()
            .map_err(|e| ComposeError::Settings(e.to_string()))
    }
}
