//! Libraries that contribute rules, plugins and Babel configuration.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::composer::Composer;
use crate::error::Result;

/// An independently authored unit registered with
/// [`Composer::add_library`].
///
/// While `configure` runs, the library is the composer's current library, so
/// library-only operations such as
/// [`Composer::add_library_scoped_rule`] are allowed and scoped to `path()`.
pub trait Library {
    fn name(&self) -> &str;

    /// Root directory of the library's files.
    fn path(&self) -> &Path;

    fn configure(&self, composer: &mut Composer, options: &Value) -> Result<()>;
}

/// Closure-backed [`Library`].
///
/// # Example
///
/// ```
/// use strata_compose::{Composer, FnLibrary, Rule};
/// use strata_rules::Pattern;
/// use serde_json::Value;
///
/// let css = FnLibrary::new("css", "/libs/css", |composer: &mut Composer, _: &Value| {
///     composer.add_library_scoped_rule(
///         Rule::new().test(Pattern::new(r"\.css$").unwrap()).loader("css-loader"),
///     )?;
///     Ok(())
/// });
///
/// let mut composer = Composer::new();
/// composer.add_library(&css, &Value::Null).unwrap();
/// assert_eq!(composer.library_rules().len(), 1);
/// ```
pub struct FnLibrary<F> {
    name: String,
    path: PathBuf,
    configure: F,
}

impl<F> FnLibrary<F>
where
    F: Fn(&mut Composer, &Value) -> Result<()>,
{
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, configure: F) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            configure,
        }
    }
}

impl<F> Library for FnLibrary<F>
where
    F: Fn(&mut Composer, &Value) -> Result<()>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn configure(&self, composer: &mut Composer, options: &Value) -> Result<()> {
        (self.configure)(composer, options)
    }
}
