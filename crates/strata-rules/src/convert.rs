//! Rule to condition conversion.
//!
//! A library that claims some files with its own rule needs every other rule
//! to stop processing those files. The converter restates "would this rule
//! have matched?" as a [`Condition`] that can be appended to another rule's
//! `exclude` list.
//!
//! Only inclusionary properties survive. `exclude` and `not` are rejected:
//! hoisting them into an outer `exclude` negates them a second time, so
//! `{exclude: {exclude: "foo"}}` would silently mean `{include: "foo"}`.

use crate::error::{Result, RuleError};
use crate::rule::{Condition, ConditionObject, MatchCondition, Rule, RuleCondition};

/// Properties carried over from a rule into its condition.
pub const ALLOWED_PROPERTIES: [&str; 4] = ["test", "include", "and", "or"];

/// Properties that make a rule unconvertible.
pub const PROHIBITED_PROPERTIES: [&str; 2] = ["exclude", "not"];

/// Convert a rule into the condition under which it applies.
///
/// Action properties (`loader`, `use`, `rules`, ...) are dropped, and so are
/// empty-path `test`/`include`/`exclude`/`not` values.
///
/// # Example
///
/// ```
/// use strata_rules::{convert_rule, Condition, MatchCondition, Pattern, Rule};
///
/// let rule = Rule::new()
///     .test(Pattern::new(r"\.css$").unwrap())
///     .loader("css-loader");
///
/// let condition = convert_rule(&rule).unwrap();
/// assert_eq!(
///     condition,
///     Condition::from(MatchCondition {
///         test: Some(Pattern::new(r"\.css$").unwrap().into()),
///         ..MatchCondition::default()
///     })
/// );
/// ```
pub fn convert_rule(rule: &Rule) -> Result<Condition> {
    let condition = convert_parts(Parts {
        test: rule.test.as_ref().filter(|c| c.is_truthy()),
        include: rule.include.as_ref().filter(|c| c.is_truthy()),
        and: rule.and.as_deref(),
        or: rule.or.as_deref(),
        exclude: rule.exclude.as_ref().is_some_and(RuleCondition::is_truthy),
        not: rule.not.as_ref().is_some_and(RuleCondition::is_truthy),
    })?;
    tracing::trace!(?condition, "converted rule to condition");
    Ok(condition)
}

/// Convert a free-standing matcher into an inclusion-only condition.
pub fn convert_condition(condition: &RuleCondition) -> Result<Condition> {
    match condition {
        RuleCondition::Path(path) => Ok(Condition::Path(path.clone())),
        RuleCondition::Pattern(pattern) => Ok(Condition::Pattern(pattern.clone())),
        RuleCondition::List(items) => convert_list(items).map(Condition::List),
        RuleCondition::Object(object) => convert_object(object),
    }
}

fn convert_object(object: &ConditionObject) -> Result<Condition> {
    convert_parts(Parts {
        test: object.test.as_ref().filter(|c| c.is_truthy()),
        include: object.include.as_ref().filter(|c| c.is_truthy()),
        and: object.and.as_deref(),
        or: object.or.as_deref(),
        exclude: object.exclude.as_ref().is_some_and(RuleCondition::is_truthy),
        not: object.not.as_ref().is_some_and(RuleCondition::is_truthy),
    })
}

struct Parts<'a> {
    test: Option<&'a RuleCondition>,
    include: Option<&'a RuleCondition>,
    and: Option<&'a [RuleCondition]>,
    or: Option<&'a [RuleCondition]>,
    exclude: bool,
    not: bool,
}

fn convert_parts(parts: Parts<'_>) -> Result<Condition> {
    let converted = MatchCondition {
        test: parts.test.map(convert_condition).transpose()?,
        include: parts.include.map(convert_condition).transpose()?,
        and: parts.and.map(convert_list).transpose()?,
        or: parts.or.map(convert_list).transpose()?,
    };

    for (property, present) in PROHIBITED_PROPERTIES.into_iter().zip([parts.exclude, parts.not]) {
        if present {
            return Err(RuleError::UnsupportedCondition { property });
        }
    }

    Ok(Condition::Match(Box::new(converted)))
}

fn convert_list(items: &[RuleCondition]) -> Result<Vec<Condition>> {
    items.iter().map(convert_condition).collect()
}
