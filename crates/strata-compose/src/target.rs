//! Host bundler configuration that [`Composer::apply`](crate::Composer::apply) patches.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strata_rules::Rule;

/// The bundler configuration object for one build.
///
/// Missing sections deserialize as empty, so a bare `{"entry": "main.js"}`
/// is a valid target. Sections this crate does not touch are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default)]
    pub resolve: Resolve,

    #[serde(default)]
    pub module: ModuleOptions,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolve {
    /// Import specifier → replacement path
    #[serde(default)]
    pub alias: IndexMap<String, String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleOptions {
    #[serde(default)]
    pub rules: Vec<Rule>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TargetConfig {
    /// Create from serde_json::Value
    ///
    /// # Example
    ///
    /// ```
    /// use strata_compose::TargetConfig;
    /// use serde_json::json;
    ///
    /// let target = TargetConfig::from_value(json!({
    ///     "entry": "main.js",
    ///     "module": { "rules": [{ "test": { "pattern": "\\.css$" }, "loader": "less-loader" }] }
    /// }))
    /// .unwrap();
    /// assert_eq!(target.module.rules.len(), 1);
    /// assert_eq!(target.extra["entry"], json!("main.js"));
    /// ```
    pub fn from_value(value: Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Convert to serde_json::Value
    pub fn to_value(&self) -> crate::Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.module.rules.push(rule);
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>, path: impl Into<String>) -> Self {
        self.resolve.alias.insert(alias.into(), path.into());
        self
    }
}

/// A bundler plugin contributed by a library.
///
/// Plugins run after the composer has patched the target and may change it
/// freely.
pub trait TargetPlugin {
    fn name(&self) -> &str;

    fn apply(&self, target: &mut TargetConfig) -> anyhow::Result<()>;
}

/// Closure-backed [`TargetPlugin`].
pub struct FnPlugin<F> {
    name: String,
    apply: F,
}

impl<F> FnPlugin<F>
where
    F: Fn(&mut TargetConfig) -> anyhow::Result<()>,
{
    pub fn new(name: impl Into<String>, apply: F) -> Self {
        Self {
            name: name.into(),
            apply,
        }
    }
}

impl<F> TargetPlugin for FnPlugin<F>
where
    F: Fn(&mut TargetConfig) -> anyhow::Result<()>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, target: &mut TargetConfig) -> anyhow::Result<()> {
        (self.apply)(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_sections_default_to_empty() {
        let target = TargetConfig::from_value(json!({ "entry": "main.js" })).unwrap();
        assert!(target.resolve.alias.is_empty());
        assert!(target.module.rules.is_empty());
    }

    #[test]
    fn malformed_target_is_reported_as_invalid_configuration() {
        let err = TargetConfig::from_value(json!({ "module": { "rules": "none" } })).unwrap_err();
        assert!(matches!(err, crate::ComposeError::Serialize(_)));
        assert!(err.to_string().starts_with("invalid bundler configuration"));
    }

    #[test]
    fn unknown_sections_round_trip() {
        let value = json!({
            "entry": "main.js",
            "resolve": { "alias": {}, "symlinks": false },
            "module": { "rules": [], "noParse": { "pattern": "jquery" } },
            "output": { "filename": "[name].js" }
        });
        let target = TargetConfig::from_value(value.clone()).unwrap();
        assert_eq!(target.to_value().unwrap(), value);
    }
}
