//! Declarative bundler rules and exclusion-safe conditions.
//!
//! [`Rule`] models a module rule as the bundler reads it. [`convert_rule`]
//! derives the [`Condition`] under which a rule applies, so the files a rule
//! claims can be excluded from every other rule.

pub mod convert;
pub mod error;
pub mod pattern;
pub mod rule;

pub use convert::{convert_condition, convert_rule, ALLOWED_PROPERTIES, PROHIBITED_PROPERTIES};
pub use error::{Result, RuleError};
pub use pattern::Pattern;
pub use rule::{Condition, ConditionObject, MatchCondition, Rule, RuleCondition, UseEntry};
