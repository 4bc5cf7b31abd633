//! Base configuration provider.
//!
//! The provider owns everything that is not bundler-specific: the stack of
//! active library registrations, the accumulated Babel presets and plugins,
//! and the alias map. [`Composer`](crate::Composer) holds one behind the
//! [`ConfigProvider`] trait and forwards to it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

/// Preset that lowers modern syntax for the configured browser targets.
pub const ENV_PRESET: &str = "@babel/preset-env";

/// Plugin that deduplicates Babel helpers through the runtime package.
pub const RUNTIME_PLUGIN: &str = "@babel/plugin-transform-runtime";

/// Plugin that rewrites imports through the alias map.
pub const MODULE_RESOLVER_PLUGIN: &str = "module-resolver";

/// A registered library, or the project itself at the root of the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryHandle {
    name: String,
    path: PathBuf,
    parent: Option<Arc<LibraryHandle>>,
}

impl LibraryHandle {
    /// Handle for the project root. It has no parent library.
    pub fn root(path: impl Into<PathBuf>) -> Self {
        Self {
            name: "<root>".to_string(),
            path: path.into(),
            parent: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The registration this library was added from. `None` for the root.
    pub fn parent_library(&self) -> Option<&LibraryHandle> {
        self.parent.as_deref()
    }

    /// The library path as the bundler expects it in a path condition.
    pub fn path_condition(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// A Babel plugin or preset reference.
///
/// Only [`BabelPlugin::Named`] entries can be re-resolved in a worker process,
/// so inline definitions rule out parallel compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BabelPlugin {
    Named(String),
    Inline(Value),
}

impl BabelPlugin {
    pub fn is_named(&self) -> bool {
        matches!(self, Self::Named(_))
    }
}

impl From<&str> for BabelPlugin {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for BabelPlugin {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

/// A plugin or preset with its options.
///
/// Serialized the way Babel reads it: the bare reference, or a
/// `[reference, options]` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct BabelEntry {
    pub plugin: BabelPlugin,
    pub options: Option<Value>,
}

impl BabelEntry {
    pub fn new(plugin: impl Into<BabelPlugin>, options: Option<Value>) -> Self {
        Self {
            plugin: plugin.into(),
            options,
        }
    }

    /// Name of the entry, if it was given by reference.
    pub fn name(&self) -> Option<&str> {
        match &self.plugin {
            BabelPlugin::Named(name) => Some(name),
            BabelPlugin::Inline(_) => None,
        }
    }
}

impl Serialize for BabelEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.options {
            None => self.plugin.serialize(serializer),
            Some(options) => {
                let mut pair = serializer.serialize_tuple(2)?;
                pair.serialize_element(&self.plugin)?;
                pair.serialize_element(options)?;
                pair.end()
            }
        }
    }
}

/// Options handed to the transform stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BabelOptions {
    pub presets: Vec<BabelEntry>,
    pub plugins: Vec<BabelEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_maps: Option<bool>,
}

/// Browser targets for the environment preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserTargets {
    pub browsers: Vec<String>,
}

impl Default for BrowserTargets {
    fn default() -> Self {
        Self {
            browsers: vec!["last 2 versions".to_string(), "ie >= 10".to_string()],
        }
    }
}

/// Options of the base provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderOptions {
    /// Project root; the path of the root library handle
    pub root: PathBuf,

    /// Route Babel helpers through the runtime package
    pub include_babel_runtime: bool,

    pub targets: BrowserTargets,

    /// Let the framework transform plugin rewrite framework imports
    pub transform_imports: bool,

    /// Resolve aliases in Babel instead of the bundler
    pub use_module_resolver: bool,

    /// Framework transform plugin, applied before any registered plugin
    pub transform_plugin: Option<String>,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            include_babel_runtime: true,
            targets: BrowserTargets::default(),
            transform_imports: false,
            use_module_resolver: false,
            transform_plugin: Some("@strata/babel-plugin-transform-react".to_string()),
        }
    }
}

/// The calls the composer needs from a base configuration provider.
pub trait ConfigProvider {
    fn options(&self) -> &ProviderOptions;

    /// The innermost active library, or the root handle.
    fn current_library(&self) -> &LibraryHandle;

    fn enter_library(&mut self, name: &str, path: &Path);

    fn exit_library(&mut self);

    fn add_babel_plugin(&mut self, plugin: BabelPlugin, options: Option<Value>);

    fn add_babel_preset(&mut self, preset: BabelPlugin, options: Option<Value>);

    fn babel_options(&self) -> BabelOptions;

    fn aliases(&self) -> &IndexMap<String, String>;

    fn add_alias(&mut self, name: &str, target: &str);
}

/// Default in-memory provider.
pub struct BaseProvider {
    options: ProviderOptions,
    root: Arc<LibraryHandle>,
    stack: Vec<Arc<LibraryHandle>>,
    presets: Vec<BabelEntry>,
    plugins: Vec<BabelEntry>,
    aliases: IndexMap<String, String>,
}

impl BaseProvider {
    pub fn new(options: ProviderOptions) -> Self {
        let root = Arc::new(LibraryHandle::root(options.root.clone()));
        Self {
            options,
            root,
            stack: Vec::new(),
            presets: Vec::new(),
            plugins: Vec::new(),
            aliases: IndexMap::new(),
        }
    }
}

impl Default for BaseProvider {
    fn default() -> Self {
        Self::new(ProviderOptions::default())
    }
}

impl fmt::Debug for BaseProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseProvider")
            .field("root", &self.root.path)
            .field("depth", &self.stack.len())
            .field("plugins", &self.plugins.len())
            .field("aliases", &self.aliases)
            .finish()
    }
}

impl ConfigProvider for BaseProvider {
    fn options(&self) -> &ProviderOptions {
        &self.options
    }

    fn current_library(&self) -> &LibraryHandle {
        self.stack.last().unwrap_or(&self.root)
    }

    fn enter_library(&mut self, name: &str, path: &Path) {
        let parent = Arc::clone(self.stack.last().unwrap_or(&self.root));
        tracing::debug!(library = name, path = %path.display(), "entering library");
        self.stack.push(Arc::new(LibraryHandle {
            name: name.to_string(),
            path: path.to_path_buf(),
            parent: Some(parent),
        }));
    }

    fn exit_library(&mut self) {
        if let Some(library) = self.stack.pop() {
            tracing::debug!(library = %library.name, "leaving library");
        }
    }

    fn add_babel_plugin(&mut self, plugin: BabelPlugin, options: Option<Value>) {
        self.plugins.push(BabelEntry { plugin, options });
    }

    fn add_babel_preset(&mut self, preset: BabelPlugin, options: Option<Value>) {
        self.presets.push(BabelEntry {
            plugin: preset,
            options,
        });
    }

    fn babel_options(&self) -> BabelOptions {
        let mut presets = vec![BabelEntry::new(
            ENV_PRESET,
            Some(json!({ "targets": self.options.targets, "modules": false })),
        )];
        presets.extend(self.presets.iter().cloned());

        let mut plugins = Vec::with_capacity(self.plugins.len() + 3);
        if let Some(transform) = &self.options.transform_plugin {
            plugins.push(BabelEntry::new(
                transform.as_str(),
                Some(json!({ "transformImports": self.options.transform_imports })),
            ));
        }
        plugins.extend(self.plugins.iter().cloned());
        if self.options.use_module_resolver {
            plugins.push(BabelEntry::new(
                MODULE_RESOLVER_PLUGIN,
                Some(json!({ "alias": self.aliases })),
            ));
        }
        if self.options.include_babel_runtime {
            plugins.push(BabelEntry::new(RUNTIME_PLUGIN, None));
        }

        BabelOptions {
            presets,
            plugins,
            source_maps: None,
        }
    }

    fn aliases(&self) -> &IndexMap<String, String> {
        &self.aliases
    }

    fn add_alias(&mut self, name: &str, target: &str) {
        self.aliases.insert(name.to_string(), target.to_string());
    }
}
