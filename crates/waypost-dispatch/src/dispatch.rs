//! The front controller.
//!
//! A [`Dispatcher`] handles exactly one request:
//!
//! ```text
//! run(request)
//!   → path from ?q=… or the request URI
//!   → Route { controller, action, flags }
//!   → view variable title = "{controller}/{action}"
//!   → call(controller, action)
//!       → {root}/{Name}Controller registered?   else HandlerNotFound
//!       → module defines {Name}Controller?      else HandlerMismatch
//!       → controller exposes {action}Action?    else OperationNotFound
//!       → build controller(view), run action
//!       → unless Suppress: render "{controller}/{action}.{ext}"
//! ```
//!
//! Dispatchers are built per request and are not `Clone`; the state they
//! carry (current route, flags) belongs to that request.

use std::path::{Path, PathBuf};

use waypost_render::Renderer;

use crate::error::DispatchError;
use crate::handler::{handler_identifier, operation_identifier, RequestContext};
use crate::registry::ControllerRegistry;
use crate::request::RequestSource;
use crate::route::{strip_query, Route};

/// Query parameter that carries the request path by default.
pub const DEFAULT_QUERY_PARAM: &str = "q";

/// Extension of view scripts rendered after an action, by default.
pub const DEFAULT_VIEW_EXTENSION: &str = "jinja";

/// Name of the view variable holding the default page title.
pub const TITLE_KEY: &str = "title";

/// Routes one request to a controller action and renders its view.
#[derive(Debug)]
pub struct Dispatcher {
    registry: ControllerRegistry,
    controller_path: Option<PathBuf>,
    renderer: Option<Renderer>,
    context: RequestContext,
    view_extension: String,
    query_param: String,
}

impl Dispatcher {
    /// Creates a dispatcher over `registry`. A controller path and a renderer
    /// must be configured before [`run`](Self::run).
    pub fn new(registry: ControllerRegistry) -> Self {
        Self {
            registry,
            controller_path: None,
            renderer: None,
            context: RequestContext::from(Route::default()),
            view_extension: DEFAULT_VIEW_EXTENSION.to_string(),
            query_param: DEFAULT_QUERY_PARAM.to_string(),
        }
    }

    /// Sets the controller lookup root.
    pub fn set_controller_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.controller_path = Some(path.into());
        self
    }

    /// Sets the renderer handed to controllers and used for automatic views.
    pub fn set_renderer(&mut self, renderer: Renderer) -> &mut Self {
        self.renderer = Some(renderer);
        self
    }

    /// Sets both the controller root and the renderer.
    pub fn configure(&mut self, root: impl Into<PathBuf>, renderer: Renderer) -> &mut Self {
        self.set_controller_path(root).set_renderer(renderer)
    }

    /// Sets the extension of automatically rendered views (without the dot).
    pub fn set_view_extension(&mut self, ext: impl Into<String>) -> &mut Self {
        self.view_extension = ext.into().trim_start_matches('.').to_string();
        self
    }

    /// Sets the query parameter that overrides the request URI.
    pub fn set_query_param(&mut self, name: impl Into<String>) -> &mut Self {
        self.query_param = name.into();
        self
    }

    /// Current controller name (`"index"` until a request names another).
    pub fn controller_name(&self) -> &str {
        &self.context.controller
    }

    /// Current action name (`"index"` until a request names another).
    pub fn action_name(&self) -> &str {
        &self.context.action
    }

    /// The controller lookup root.
    pub fn controller_path(&self) -> Option<&Path> {
        self.controller_path.as_deref()
    }

    /// The configured renderer.
    pub fn renderer(&self) -> Option<&Renderer> {
        self.renderer.as_ref()
    }

    /// Route and flags of the current request.
    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// The controller registry.
    pub fn registry(&self) -> &ControllerRegistry {
        &self.registry
    }

    fn configured(&self) -> Result<(&Path, &Renderer), DispatchError> {
        let root = self.controller_path.as_deref().ok_or_else(|| {
            DispatchError::Configuration("a controller path was not provided".into())
        })?;
        let renderer = self
            .renderer
            .as_ref()
            .ok_or_else(|| DispatchError::Configuration("a renderer was not provided".into()))?;
        Ok((root, renderer))
    }

    /// Processes one request.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Configuration`] before any parsing if the controller
    ///   path or renderer is missing
    /// - any error from [`call`](Self::call)
    pub fn run(&mut self, request: &impl RequestSource) -> Result<(), DispatchError> {
        let (_, renderer) = self.configured()?;
        let renderer = renderer.clone();

        let raw = match request.query_param(&self.query_param) {
            Some(path) => path,
            None => strip_query(&request.request_uri()).to_string(),
        };
        let route = Route::parse(&raw);
        tracing::debug!(
            raw = %raw,
            controller = %route.controller,
            action = %route.action,
            flags = ?route.flags,
            "parsed request route"
        );
        self.context = RequestContext::from(route);

        renderer.set(
            TITLE_KEY,
            format!("{}/{}", self.context.controller, self.context.action),
        );

        let controller = self.context.controller.clone();
        let action = self.context.action.clone();
        self.call(&controller, &action)
    }

    /// Resolves `controller`, invokes `action`, and renders
    /// `{controller}/{action}.{ext}` unless the action suppresses it.
    ///
    /// Flags from the last [`run`](Self::run) are passed to the action.
    pub fn call(&mut self, controller: &str, action: &str) -> Result<(), DispatchError> {
        let (root, renderer) = self.configured()?;
        let renderer = renderer.clone();

        let handler = handler_identifier(controller);
        let operation = operation_identifier(action);
        let path = root.join(&handler);

        let module = self
            .registry
            .module(&path)
            .ok_or_else(|| DispatchError::HandlerNotFound {
                handler: handler.clone(),
                path: path.clone(),
            })?;
        let def = module
            .controller(&handler)
            .ok_or_else(|| DispatchError::HandlerMismatch {
                handler: handler.clone(),
                path: path.clone(),
            })?;
        if !def.has_action(&operation) {
            return Err(DispatchError::OperationNotFound { operation, handler });
        }

        tracing::debug!(%handler, %operation, path = %path.display(), "invoking action");
        let mut instance = def.instantiate(renderer.clone());
        let outcome = instance
            .call(&operation, &mut self.context)
            .map_err(DispatchError::Action)?;

        if outcome.should_render() {
            let view = format!(
                "{}/{}.{}",
                controller.to_lowercase(),
                action.to_lowercase(),
                self.view_extension
            );
            tracing::debug!(%view, "rendering action view");
            renderer.render(&view)?;
        } else {
            tracing::debug!(%operation, "action suppressed its view");
        }
        Ok(())
    }
}
