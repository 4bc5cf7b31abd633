//! Declarative rule and condition model consumed by the bundler.
//!
//! Two matcher languages live here:
//!
//! - [`RuleCondition`] is everything a user or library may write on a rule,
//!   including the exclusionary `exclude` and `not` properties.
//! - [`Condition`] is the inclusion-only subset. It has no way to express
//!   `exclude` or `not`, so it is always safe to append to another rule's
//!   `exclude` list without flipping its meaning.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::pattern::Pattern;

/// Full matcher language accepted on a [`Rule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleCondition {
    /// Any of the nested conditions.
    List(Vec<RuleCondition>),
    Pattern(Pattern),
    Object(Box<ConditionObject>),
    /// Absolute path prefix.
    Path(String),
}

/// Object form of a [`RuleCondition`]. Every present property must match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<RuleCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<RuleCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<RuleCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub and: Option<Vec<RuleCondition>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub or: Option<Vec<RuleCondition>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<RuleCondition>,
}

/// Inclusion-only matcher, usable as an exclusion on another rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    List(Vec<Condition>),
    Pattern(Pattern),
    Match(Box<MatchCondition>),
    Path(String),
}

/// Object form of a [`Condition`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<Condition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Condition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub and: Option<Vec<Condition>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub or: Option<Vec<Condition>>,
}

/// One stage of a rule's `use` pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UseEntry {
    pub loader: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

impl UseEntry {
    pub fn new(loader: impl Into<String>) -> Self {
        Self {
            loader: loader.into(),
            options: None,
        }
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }
}

/// A bundler module rule: matcher properties plus the action to run.
///
/// Properties the model does not know about are kept in `extra` so they
/// survive a round trip to the bundler untouched.
///
/// # Example
///
/// ```
/// use strata_rules::{Pattern, Rule};
///
/// let rule = Rule::new()
///     .test(Pattern::new(r"\.css$").unwrap())
///     .loader("css-loader");
/// assert!(rule.matches("/app/src/main.css"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<RuleCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<RuleCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<RuleCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub and: Option<Vec<RuleCondition>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub or: Option<Vec<RuleCondition>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<RuleCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loader: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,

    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_entries: Option<Vec<UseEntry>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Rule>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Rule>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Rule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn test(mut self, condition: impl Into<RuleCondition>) -> Self {
        self.test = Some(condition.into());
        self
    }

    pub fn include(mut self, condition: impl Into<RuleCondition>) -> Self {
        self.include = Some(condition.into());
        self
    }

    pub fn exclude(mut self, condition: impl Into<RuleCondition>) -> Self {
        self.exclude = Some(condition.into());
        self
    }

    pub fn and(mut self, conditions: Vec<RuleCondition>) -> Self {
        self.and = Some(conditions);
        self
    }

    pub fn or(mut self, conditions: Vec<RuleCondition>) -> Self {
        self.or = Some(conditions);
        self
    }

    pub fn not(mut self, condition: impl Into<RuleCondition>) -> Self {
        self.not = Some(condition.into());
        self
    }

    pub fn loader(mut self, loader: impl Into<String>) -> Self {
        self.loader = Some(loader.into());
        self
    }

    pub fn options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }

    pub fn use_entry(mut self, entry: UseEntry) -> Self {
        self.use_entries.get_or_insert_with(Vec::new).push(entry);
        self
    }

    pub fn rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Whether the rule's matcher properties select `resource`.
    ///
    /// Nested `rules`/`oneOf` are not consulted; they refine the action, not
    /// the outer selection.
    pub fn matches(&self, resource: &str) -> bool {
        matches_parts(
            self.test.as_ref(),
            self.include.as_ref(),
            self.exclude.as_ref(),
            self.and.as_deref(),
            self.or.as_deref(),
            self.not.as_ref(),
            resource,
        )
    }
}

impl RuleCondition {
    /// Whether the condition counts as set. An empty path is treated the same
    /// as an absent property.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Self::Path(path) if path.is_empty())
    }

    pub fn matches(&self, resource: &str) -> bool {
        match self {
            Self::Path(prefix) => resource.starts_with(prefix.as_str()),
            Self::Pattern(pattern) => pattern.is_match(resource),
            Self::List(items) => items.iter().any(|item| item.matches(resource)),
            Self::Object(object) => matches_parts(
                object.test.as_ref(),
                object.include.as_ref(),
                object.exclude.as_ref(),
                object.and.as_deref(),
                object.or.as_deref(),
                object.not.as_ref(),
                resource,
            ),
        }
    }
}

fn matches_parts(
    test: Option<&RuleCondition>,
    include: Option<&RuleCondition>,
    exclude: Option<&RuleCondition>,
    and: Option<&[RuleCondition]>,
    or: Option<&[RuleCondition]>,
    not: Option<&RuleCondition>,
    resource: &str,
) -> bool {
    test.is_none_or(|c| c.matches(resource))
        && include.is_none_or(|c| c.matches(resource))
        && exclude.is_none_or(|c| !c.matches(resource))
        && and.is_none_or(|cs| cs.iter().all(|c| c.matches(resource)))
        && or.is_none_or(|cs| cs.iter().any(|c| c.matches(resource)))
        && not.is_none_or(|c| !c.matches(resource))
}

impl Condition {
    /// Conjunction of `conditions`, expressed as `{and: [...]}`.
    pub fn all(conditions: Vec<Condition>) -> Self {
        Self::Match(Box::new(MatchCondition {
            and: Some(conditions),
            ..MatchCondition::default()
        }))
    }

    pub fn matches(&self, resource: &str) -> bool {
        match self {
            Self::Path(prefix) => resource.starts_with(prefix.as_str()),
            Self::Pattern(pattern) => pattern.is_match(resource),
            Self::List(items) => items.iter().any(|item| item.matches(resource)),
            Self::Match(object) => {
                object.test.as_ref().is_none_or(|c| c.matches(resource))
                    && object.include.as_ref().is_none_or(|c| c.matches(resource))
                    && object
                        .and
                        .as_ref()
                        .is_none_or(|cs| cs.iter().all(|c| c.matches(resource)))
                    && object
                        .or
                        .as_ref()
                        .is_none_or(|cs| cs.iter().any(|c| c.matches(resource)))
            }
        }
    }
}

impl From<Condition> for RuleCondition {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Path(path) => Self::Path(path),
            Condition::Pattern(pattern) => Self::Pattern(pattern),
            Condition::List(items) => Self::List(items.into_iter().map(Into::into).collect()),
            Condition::Match(object) => {
                let MatchCondition {
                    test,
                    include,
                    and,
                    or,
                } = *object;
                Self::Object(Box::new(ConditionObject {
                    test: test.map(Into::into),
                    include: include.map(Into::into),
                    and: and.map(|cs| cs.into_iter().map(Into::into).collect()),
                    or: or.map(|cs| cs.into_iter().map(Into::into).collect()),
                    exclude: None,
                    not: None,
                }))
            }
        }
    }
}

impl From<ConditionObject> for RuleCondition {
    fn from(object: ConditionObject) -> Self {
        Self::Object(Box::new(object))
    }
}

impl From<Pattern> for RuleCondition {
    fn from(pattern: Pattern) -> Self {
        Self::Pattern(pattern)
    }
}

impl From<&str> for RuleCondition {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for RuleCondition {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl From<Vec<RuleCondition>> for RuleCondition {
    fn from(items: Vec<RuleCondition>) -> Self {
        Self::List(items)
    }
}

impl From<MatchCondition> for Condition {
    fn from(object: MatchCondition) -> Self {
        Self::Match(Box::new(object))
    }
}

impl From<Pattern> for Condition {
    fn from(pattern: Pattern) -> Self {
        Self::Pattern(pattern)
    }
}

impl From<&str> for Condition {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for Condition {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}
