//! Template engine abstraction.
//!
//! This module defines the [`TemplateEngine`] trait, the seam between the
//! [`Renderer`] (which owns directories, variables and output) and whatever
//! actually evaluates a view file. The default implementation is
//! [`MiniJinjaEngine`].
//!
//! # Template helpers
//!
//! Every view evaluated by [`MiniJinjaEngine`] can call:
//!
//! | Function | Result |
//! |----------|--------|
//! | `partial(name, vars=none, output=false)` | Renders `name` from the script directory with `vars` as its whole scope. The text lands at the call site, including inside `set` blocks, filters and macros, whatever `output` says. |
//! | `base_url(suffix="")` | The configured base URL joined with `suffix`. |
//!
//! Includes (`{% include "shared/nav.jinja" %}`) resolve relative to the
//! directory the current view was loaded from.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use minijinja::{Environment, Value};

use crate::error::RenderError;
use crate::renderer::{Renderer, RenderMode};
use crate::variables::{Variables, CONTENT_KEY};

/// A view file resolved against its root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewFile {
    /// Name relative to the root, without a leading slash (e.g. `"index/index.jinja"`).
    pub name: String,
    /// Full path of the file.
    pub path: PathBuf,
    /// Directory the name is relative to.
    pub root: PathBuf,
}

impl ViewFile {
    /// Resolves a normalised name (leading slash) against `root`.
    pub fn resolve(root: &Path, normalized: &str) -> Self {
        let name = normalized.trim_start_matches('/').to_string();
        Self {
            path: root.join(&name),
            root: root.to_path_buf(),
            name,
        }
    }
}

/// Evaluates view files.
///
/// Implementations write the evaluated text into `out` and may call back into
/// `view` for partials and other helpers. They must not cache variables:
/// `scope` is the complete set for this evaluation.
pub trait TemplateEngine: Send + Sync {
    /// Evaluates `file` with `scope` bound, writing the result into `out`.
    fn evaluate(
        &self,
        file: &ViewFile,
        scope: &Variables,
        view: &Renderer,
        out: &mut dyn Write,
    ) -> Result<(), RenderError>;
}

/// MiniJinja-based view evaluation.
///
/// A fresh environment is built per evaluation so that helpers see the
/// renderer they were called from and includes resolve against the right
/// root.
#[derive(Debug, Default, Clone, Copy)]
pub struct MiniJinjaEngine;

impl MiniJinjaEngine {
    /// Creates the engine.
    pub fn new() -> Self {
        Self
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn evaluate(
        &self,
        file: &ViewFile,
        scope: &Variables,
        view: &Renderer,
        out: &mut dyn Write,
    ) -> Result<(), RenderError> {
        let source = std::fs::read_to_string(&file.path)?;

        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(file.root.clone()));
        register_helpers(&mut env, view);

        let template = env.template_from_named_str(&file.name, &source)?;
        template.render_captured_to(template_context(scope), out)?;
        Ok(())
    }
}

/// Converts the variable set into a template context.
///
/// Rendered child output under [`CONTENT_KEY`] is marked safe so that layouts
/// with HTML auto-escaping embed it verbatim.
fn template_context(scope: &Variables) -> BTreeMap<String, Value> {
    scope
        .iter()
        .map(|(name, value)| {
            let value = match value {
                serde_json::Value::String(text) if name == CONTENT_KEY => {
                    Value::from_safe_string(text.clone())
                }
                other => Value::from_serialize(other),
            };
            (name.clone(), value)
        })
        .collect()
}

/// Registers the view helpers (`partial`, `base_url`) bound to `view`.
pub fn register_helpers(env: &mut Environment<'_>, view: &Renderer) {
    let handle = view.clone();
    env.add_function(
        "partial",
        move |name: String,
              vars: Option<Value>,
              _output: Option<bool>|
              -> Result<Value, minijinja::Error> {
            let scope = match vars {
                Some(vars) if !vars.is_none() && !vars.is_undefined() => {
                    Variables::from_serialize(&vars)?
                }
                _ => Variables::new(),
            };
            // Both modes return the text so enclosing `set` blocks, filters
            // and macros capture it at the call site.
            let text = handle.render_partial(&name, scope, RenderMode::Return)?;
            Ok(Value::from_safe_string(text))
        },
    );

    let handle = view.clone();
    env.add_function("base_url", move |suffix: Option<String>| -> String {
        handle.base_url(suffix.as_deref().unwrap_or(""))
    });
}
