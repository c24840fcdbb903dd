//! Controller registry.
//!
//! Controllers are registered up front instead of being loaded from disk at
//! request time. The registry keeps the on-disk shape of a controller tree
//! though: it maps a module path (`{controller_root}/{HandlerIdentifier}`) to
//! a [`ControllerModule`], and a module defines one or more controllers by
//! handler identifier. That keeps the two failure modes distinct:
//!
//! - nothing registered at the path: the controller does not exist
//! - a module at the path that defines a different name: mismatch
//!
//! ```rust
//! use waypost_dispatch::{ControllerModule, ControllerRegistry};
//!
//! let mut registry = ControllerRegistry::new();
//! registry.register_module("app/controllers/IndexController", ControllerModule::new());
//! assert!(registry.module("app/controllers/IndexController").is_some());
//! assert!(registry.module("app/IndexController").is_none());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use waypost_render::Renderer;

use crate::handler::{Controller, ControllerType};

/// Builds a controller instance for one request.
pub type ControllerFactory = Box<dyn Fn(Renderer) -> Box<dyn Controller>>;

/// A registered controller: its operations and how to build it.
pub struct ControllerDef {
    name: String,
    actions: Vec<String>,
    factory: ControllerFactory,
}

impl ControllerDef {
    /// Defines a controller from a factory closure.
    pub fn new<F>(name: impl Into<String>, actions: &[&str], factory: F) -> Self
    where
        F: Fn(Renderer) -> Box<dyn Controller> + 'static,
    {
        Self {
            name: name.into(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
            factory: Box::new(factory),
        }
    }

    /// Defines a controller from its type.
    pub fn of<C: ControllerType>() -> Self {
        Self::new(C::NAME, C::ACTIONS, |view| {
            Box::new(C::new(view)) as Box<dyn Controller>
        })
    }

    /// Handler identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operation identifiers.
    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    /// Returns `true` if the controller exposes `operation`.
    pub fn has_action(&self, operation: &str) -> bool {
        self.actions.iter().any(|a| a == operation)
    }

    /// Builds an instance with `view` injected.
    pub fn instantiate(&self, view: Renderer) -> Box<dyn Controller> {
        (self.factory)(view)
    }
}

impl fmt::Debug for ControllerDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerDef")
            .field("name", &self.name)
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

/// The controllers defined at one module path.
#[derive(Debug, Default)]
pub struct ControllerModule {
    controllers: BTreeMap<String, ControllerDef>,
}

impl ControllerModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a controller definition.
    pub fn define(mut self, def: ControllerDef) -> Self {
        self.controllers.insert(def.name.clone(), def);
        self
    }

    /// Adds a controller by type.
    pub fn define_type<C: ControllerType>(self) -> Self {
        self.define(ControllerDef::of::<C>())
    }

    /// Looks up a controller by handler identifier.
    pub fn controller(&self, name: &str) -> Option<&ControllerDef> {
        self.controllers.get(name)
    }

    /// Handler identifiers defined in this module.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.controllers.keys().map(String::as_str)
    }
}

/// Module path → module.
#[derive(Debug, Default)]
pub struct ControllerRegistry {
    modules: BTreeMap<PathBuf, ControllerModule>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `C` in its own module at `{root}/{C::NAME}`.
    pub fn register<C: ControllerType>(&mut self, root: impl AsRef<Path>) -> &mut Self {
        let path = root.as_ref().join(C::NAME);
        self.register_module(path, ControllerModule::new().define_type::<C>())
    }

    /// Registers a module at an explicit path, replacing any previous one.
    pub fn register_module(
        &mut self,
        path: impl Into<PathBuf>,
        module: ControllerModule,
    ) -> &mut Self {
        let path = path.into();
        tracing::debug!(
            path = %path.display(),
            controllers = ?module.names().collect::<Vec<_>>(),
            "registered controller module"
        );
        self.modules.insert(path, module);
        self
    }

    /// Looks up the module registered at `path`.
    pub fn module(&self, path: impl AsRef<Path>) -> Option<&ControllerModule> {
        self.modules.get(path.as_ref())
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
