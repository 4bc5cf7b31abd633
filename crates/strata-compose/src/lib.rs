//! Library-aware bundler configuration.
//!
//! Libraries register bundler rules, plugins and Babel plugins with a
//! [`Composer`]. At [`Composer::apply`] the composer adds a transform rule for
//! source files, scopes each library rule to the library's own path, and
//! excludes library-owned files from the project's generic rules.
//!
//! # Example
//!
//! ```
//! use serde_json::Value;
//! use strata_compose::{Composer, FnLibrary, Rule, TargetConfig};
//! use strata_rules::Pattern;
//!
//! let css = Pattern::new(r"\.css$").unwrap();
//! let theme = FnLibrary::new("theme", "/libs/theme", {
//!     let css = css.clone();
//!     move |composer: &mut Composer, _: &Value| {
//!         composer.add_library_scoped_rule(Rule::new().test(css.clone()).loader("css-loader"))?;
//!         Ok(())
//!     }
//! });
//!
//! let mut composer = Composer::new();
//! composer.add_library(&theme, &Value::Null).unwrap();
//!
//! let mut target = TargetConfig::default().with_rule(Rule::new().test(css).loader("less-loader"));
//! composer.apply(&mut target).unwrap();
//!
//! // project rule, transform rule, library rule
//! assert_eq!(target.module.rules.len(), 3);
//! ```

pub mod composer;
pub mod error;
pub mod library;
pub mod provider;
pub mod settings;
pub mod target;

pub use composer::{Composer, DEFAULT_BABEL_PLUGINS, PARALLEL_COMPILE_LOADER, TRANSFORM_LOADER};
pub use error::{ComposeError, Result};
pub use library::{FnLibrary, Library};
pub use provider::{
    BabelEntry, BabelOptions, BabelPlugin, BaseProvider, BrowserTargets, ConfigProvider,
    LibraryHandle, ProviderOptions,
};
pub use settings::ComposerSettings;
pub use target::{FnPlugin, ModuleOptions, Resolve, TargetConfig, TargetPlugin};

pub use strata_rules::{Condition, Pattern, Rule, RuleCondition, UseEntry};
