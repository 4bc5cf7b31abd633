//! Composes library contributions into a host bundler configuration.
//!
//! Libraries register rules and plugins while a configuration is being built.
//! Nothing touches the target until [`Composer::apply`], which runs, in order:
//!
//! 1. merge aliases (user aliases win),
//! 2. append the transform rule,
//! 3. append every library-claimed condition to the `exclude` of each rule
//!    already in the target,
//! 4. append the library rules,
//! 5. run library plugins.
//!
//! ```text
//! add_library_scoped_rule(R) ──► exclude shadow {and: [lib, cond(R)]}
//!                            └─► library rule   {include: lib, rules: [R]}
//! ```

use std::fmt;
use std::mem;

use serde_json::Value;
use strata_rules::{convert_rule, Condition, Pattern, Rule, RuleCondition, UseEntry};

use crate::error::{ComposeError, Result};
use crate::library::Library;
use crate::provider::{BabelPlugin, BaseProvider, ConfigProvider, LibraryHandle};
use crate::settings::{ComposerSettings, DEFAULT_TRANSFORM_RULE_TEST};
use crate::target::{TargetConfig, TargetPlugin};

/// Stage that spreads transform work over worker processes.
pub const PARALLEL_COMPILE_LOADER: &str = "thread-loader";

/// Stage that runs the source transform.
pub const TRANSFORM_LOADER: &str = "babel-loader";

/// JSX plugins registered on every composer.
pub const DEFAULT_BABEL_PLUGINS: [&str; 3] = [
    "syntax-jsx",
    "transform-react-jsx",
    "transform-react-display-name",
];

pub struct Composer {
    provider: Box<dyn ConfigProvider>,
    add_transform_rule: bool,
    add_parallel_compilation: bool,
    use_source_maps: bool,
    transform_rule_test: Pattern,
    transform_excludes: Vec<RuleCondition>,
    pending_plugins: Vec<Box<dyn TargetPlugin>>,
    non_library_excludes: Vec<Condition>,
    library_rules: Vec<Rule>,
    applied: bool,
}

impl Composer {
    pub fn new() -> Self {
        Self::with_provider(Box::new(BaseProvider::default()))
    }

    /// Build a composer on top of a caller-supplied provider.
    pub fn with_provider(provider: Box<dyn ConfigProvider>) -> Self {
        let mut composer = Self {
            provider,
            add_transform_rule: true,
            add_parallel_compilation: true,
            use_source_maps: true,
            transform_rule_test: default_transform_rule_test(),
            transform_excludes: Vec::new(),
            pending_plugins: Vec::new(),
            non_library_excludes: Vec::new(),
            library_rules: Vec::new(),
            applied: false,
        };
        for plugin in DEFAULT_BABEL_PLUGINS {
            composer.add_babel_plugin(plugin, None);
        }
        composer
    }

    /// Build a composer from loaded [`ComposerSettings`].
    pub fn from_settings(settings: &ComposerSettings) -> Result<Self> {
        let provider = BaseProvider::new(settings.provider.clone());
        let mut composer = Self::with_provider(Box::new(provider));

        if !settings.transform_rule {
            composer.without_transform_rule();
        }
        if !settings.parallel_compilation {
            composer.without_parallel_compilation();
        }
        if !settings.source_maps {
            composer.without_source_maps();
        }
        composer.set_transform_rule_test(&settings.transform_rule_test)?;
        for source in &settings.transform_excludes {
            let pattern = Pattern::new(source).map_err(|err| ComposeError::InvalidArgument {
                operation: "add_transform_rule_exclude",
                message: err.to_string(),
            })?;
            composer.add_transform_rule_exclude(pattern);
        }

        Ok(composer)
    }

    pub fn provider(&self) -> &dyn ConfigProvider {
        self.provider.as_ref()
    }

    pub fn current_library(&self) -> &LibraryHandle {
        self.provider.current_library()
    }

    /// Conditions appended to the `exclude` of every non-library rule.
    pub fn non_library_excludes(&self) -> &[Condition] {
        &self.non_library_excludes
    }

    /// Rules appended to the target after the excludes are patched in.
    pub fn library_rules(&self) -> &[Rule] {
        &self.library_rules
    }

    pub fn transform_rule_test(&self) -> &Pattern {
        &self.transform_rule_test
    }

    pub fn uses_parallel_compilation(&self) -> bool {
        self.add_parallel_compilation
    }

    /// Skip the generated transform rule, e.g. when the project already has one.
    pub fn without_transform_rule(&mut self) -> &mut Self {
        self.add_transform_rule = false;
        self
    }

    pub fn without_parallel_compilation(&mut self) -> &mut Self {
        self.add_parallel_compilation = false;
        self
    }

    pub fn without_source_maps(&mut self) -> &mut Self {
        self.use_source_maps = false;
        self
    }

    /// Replace the transform rule's `test` with a pattern compiled from `source`.
    pub fn set_transform_rule_test(&mut self, source: &str) -> Result<&mut Self> {
        let pattern = Pattern::new(source).map_err(|err| ComposeError::InvalidArgument {
            operation: "set_transform_rule_test",
            message: format!("expected a pattern; {err}"),
        })?;
        Ok(self.set_transform_rule_pattern(pattern))
    }

    pub fn set_transform_rule_pattern(&mut self, pattern: Pattern) -> &mut Self {
        self.transform_rule_test = pattern;
        self
    }

    /// Exclude files that would otherwise match the transform rule.
    pub fn add_transform_rule_exclude(&mut self, exclude: impl Into<RuleCondition>) -> &mut Self {
        self.note_late_registration("add_transform_rule_exclude");
        self.transform_excludes.push(exclude.into());
        self
    }

    /// Add an alias to the provider's alias map. User aliases still win at apply time.
    pub fn add_alias(&mut self, name: &str, target: &str) -> &mut Self {
        self.provider.add_alias(name, target);
        self
    }

    /// Register a library and run its configuration inside its own scope.
    ///
    /// The scope is left again even when `configure` fails.
    pub fn add_library(&mut self, library: &dyn Library, options: &Value) -> Result<&mut Self> {
        self.provider.enter_library(library.name(), library.path());
        let result = library.configure(self, options);
        self.provider.exit_library();
        result?;
        Ok(self)
    }

    /// Add a bundler plugin on behalf of the current library.
    pub fn add_plugin(&mut self, plugin: Box<dyn TargetPlugin>) -> Result<&mut Self> {
        let library = self.ensure_library_scope("add_plugin")?;
        tracing::debug!(library = %library.name(), plugin = plugin.name(), "registered plugin");
        self.note_late_registration("add_plugin");
        self.pending_plugins.push(plugin);
        Ok(self)
    }

    /// Add a rule that only applies to files inside the current library.
    ///
    /// Files the rule claims are excluded from every other rule, so the
    /// library's handling wins over the project's own rules for its files.
    pub fn add_library_scoped_rule(&mut self, rule: Rule) -> Result<&mut Self> {
        let library = self.ensure_library_scope("add_library_scoped_rule")?;
        let path = library.path_condition();
        let shadow = Condition::all(vec![Condition::Path(path.clone()), convert_rule(&rule)?]);

        tracing::debug!(library = %library.name(), path = %path, "registered library-scoped rule");
        self.note_late_registration("add_library_scoped_rule");
        self.non_library_excludes.push(shadow);
        self.library_rules.push(Rule::new().include(path).rules(vec![rule]));
        Ok(self)
    }

    /// Add a rule for files outside the current library.
    ///
    /// The rule must scope itself with a non-empty `include`. Matching files belong to
    /// the library: a project rule for the same files is excluded from them.
    pub fn add_global_scoped_rule(&mut self, rule: Rule) -> Result<&mut Self> {
        let library = self.ensure_library_scope("add_global_scoped_rule")?;
        if !rule.include.as_ref().is_some_and(RuleCondition::is_truthy) {
            return Err(ComposeError::InvalidArgument {
                operation: "add_global_scoped_rule",
                message: "the rule must have an `include` property pointing at the files it owns"
                    .to_string(),
            });
        }
        let shadow = convert_rule(&rule)?;

        tracing::debug!(library = %library.name(), "registered global-scoped rule");
        self.note_late_registration("add_global_scoped_rule");
        self.non_library_excludes.push(shadow);
        self.library_rules.push(rule);
        Ok(self)
    }

    /// Add a Babel plugin.
    ///
    /// Worker processes can only load plugins by name, so an inline plugin
    /// turns parallel compilation off.
    pub fn add_babel_plugin(
        &mut self,
        plugin: impl Into<BabelPlugin>,
        options: Option<Value>,
    ) -> &mut Self {
        let plugin = plugin.into();
        if !plugin.is_named() && self.add_parallel_compilation {
            tracing::warn!(
                "parallel compilation needs every Babel plugin to be passed by name; \
                 pass the plugin's module name instead of its definition to keep it enabled"
            );
            self.add_parallel_compilation = false;
        }
        self.provider.add_babel_plugin(plugin, options);
        self
    }

    pub fn add_babel_preset(
        &mut self,
        preset: impl Into<BabelPlugin>,
        options: Option<Value>,
    ) -> &mut Self {
        self.provider.add_babel_preset(preset.into(), options);
        self
    }

    /// Patch `target` with everything registered so far.
    ///
    /// A composer applies once; a second call fails with
    /// [`ComposeError::AlreadyApplied`] and leaves the target untouched. If a
    /// plugin fails, the earlier steps have already been written to `target`.
    pub fn apply(&mut self, target: &mut TargetConfig) -> Result<()> {
        if self.applied {
            return Err(ComposeError::AlreadyApplied);
        }
        self.applied = true;

        let user_aliases = mem::take(&mut target.resolve.alias);
        let mut aliases = self.provider.aliases().clone();
        aliases.extend(user_aliases);
        target.resolve.alias = aliases;

        if self.add_transform_rule {
            let rule = self.transform_rule()?;
            target.module.rules.push(rule);
        }

        for rule in &mut target.module.rules {
            let mut excludes = match rule.exclude.take() {
                None => Vec::new(),
                Some(RuleCondition::List(items)) => items,
                Some(single) => vec![single],
            };
            excludes.extend(self.non_library_excludes.iter().cloned().map(RuleCondition::from));
            rule.exclude = Some(RuleCondition::List(excludes));
        }

        target.module.rules.extend(self.library_rules.iter().cloned());

        tracing::info!(
            rules = target.module.rules.len(),
            library_rules = self.library_rules.len(),
            plugins = self.pending_plugins.len(),
            "applied build configuration"
        );

        for plugin in &self.pending_plugins {
            tracing::debug!(plugin = plugin.name(), "applying plugin");
            plugin
                .apply(target)
                .map_err(|source| ComposeError::Plugin {
                    name: plugin.name().to_string(),
                    source,
                })?;
        }

        Ok(())
    }

    fn transform_rule(&self) -> Result<Rule> {
        let mut babel = self.provider.babel_options();
        babel.source_maps = Some(self.use_source_maps);

        let mut rule = Rule::new().test(self.transform_rule_test.clone());
        if self.add_parallel_compilation {
            rule = rule.use_entry(UseEntry::new(PARALLEL_COMPILE_LOADER));
        }
        rule = rule
            .use_entry(UseEntry::new(TRANSFORM_LOADER).with_options(serde_json::to_value(&babel)?))
            .exclude(self.transform_excludes.clone());
        Ok(rule)
    }

    fn ensure_library_scope(&self, operation: &'static str) -> Result<LibraryHandle> {
        let library = self.provider.current_library();
        if library.parent_library().is_none() {
            return Err(ComposeError::ScopeViolation { operation });
        }
        Ok(library.clone())
    }

    fn note_late_registration(&self, operation: &str) {
        if self.applied {
            tracing::warn!(operation, "registration after apply() has no effect on the target");
        }
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Composer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plugins: Vec<&str> = self.pending_plugins.iter().map(|p| p.name()).collect();
        f.debug_struct("Composer")
            .field("add_transform_rule", &self.add_transform_rule)
            .field("add_parallel_compilation", &self.add_parallel_compilation)
            .field("use_source_maps", &self.use_source_maps)
            .field("transform_rule_test", &self.transform_rule_test)
            .field("transform_excludes", &self.transform_excludes)
            .field("pending_plugins", &plugins)
            .field("non_library_excludes", &self.non_library_excludes)
            .field("library_rules", &self.library_rules)
            .field("applied", &self.applied)
            .finish()
    }
}

fn default_transform_rule_test() -> Pattern {
    DEFAULT_TRANSFORM_RULE_TEST
        .parse()
        .unwrap_or_else(|err| unreachable!("default transform pattern is valid: {err}"))
}
