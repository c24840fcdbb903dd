//! Controller types.
//!
//! A controller is a unit that exposes named, argument-less actions. The
//! dispatcher builds one per request with the shared [`Renderer`] injected,
//! invokes a single action, and renders the action's view unless the action
//! asked it not to.
//!
//! # Core Types
//!
//! - [`Controller`]: object-safe action entry point (`&mut self`)
//! - [`ControllerType`]: a concrete controller that can be registered by type
//! - [`RequestContext`]: the route and flags of the current request
//! - [`ActionOutcome`] / [`HandlerResult`]: what an action produces
//! - [`IntoActionResult`]: lets actions return `()`, `bool` or `Result`s of
//!   either
//!
//! # Example
//!
//! ```rust
//! use waypost_dispatch::{Controller, ControllerType, HandlerResult, IntoActionResult, RequestContext};
//! use waypost_render::Renderer;
//!
//! struct BlogController {
//!     view: Renderer,
//! }
//!
//! impl BlogController {
//!     fn post(&mut self, ctx: &RequestContext) {
//!         self.view.set("draft", ctx.has_flag("draft"));
//!     }
//!
//!     // Returning false skips the automatic view.
//!     fn feed(&mut self) -> bool {
//!         let _ = self.view.emit("<rss/>");
//!         false
//!     }
//! }
//!
//! impl Controller for BlogController {
//!     fn call(&mut self, operation: &str, ctx: &mut RequestContext) -> HandlerResult {
//!         match operation {
//!             "postAction" => self.post(ctx).into_action_result(),
//!             "feedAction" => self.feed().into_action_result(),
//!             other => Err(anyhow::anyhow!("unknown operation {}", other)),
//!         }
//!     }
//! }
//!
//! impl ControllerType for BlogController {
//!     const NAME: &'static str = "BlogController";
//!     const ACTIONS: &'static [&'static str] = &["postAction", "feedAction"];
//!
//!     fn new(view: Renderer) -> Self {
//!         Self { view }
//!     }
//! }
//! ```

use std::collections::BTreeSet;

use waypost_render::Renderer;

use crate::route::Route;

/// What an action asks the dispatcher to do after it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionOutcome {
    /// Render `{controller}/{action}.{ext}`.
    #[default]
    Render,
    /// Skip the automatic view. The action produced its own output, or none.
    Suppress,
}

impl ActionOutcome {
    /// Returns `true` if the view should be rendered.
    pub fn should_render(self) -> bool {
        matches!(self, ActionOutcome::Render)
    }
}

impl From<()> for ActionOutcome {
    fn from(_: ()) -> Self {
        ActionOutcome::Render
    }
}

/// `false` suppresses rendering, `true` keeps it.
impl From<bool> for ActionOutcome {
    fn from(render: bool) -> Self {
        if render {
            ActionOutcome::Render
        } else {
            ActionOutcome::Suppress
        }
    }
}

/// Result type for actions.
pub type HandlerResult = Result<ActionOutcome, anyhow::Error>;

/// Conversion of action return values into a [`HandlerResult`].
///
/// ```rust
/// use waypost_dispatch::{ActionOutcome, IntoActionResult};
///
/// assert_eq!(().into_action_result().unwrap(), ActionOutcome::Render);
/// assert_eq!(false.into_action_result().unwrap(), ActionOutcome::Suppress);
///
/// let failed: Result<(), std::io::Error> = Err(std::io::Error::other("disk"));
/// assert!(failed.into_action_result().is_err());
/// ```
pub trait IntoActionResult {
    /// Converts `self` into a [`HandlerResult`].
    fn into_action_result(self) -> HandlerResult;
}

impl IntoActionResult for () {
    fn into_action_result(self) -> HandlerResult {
        Ok(ActionOutcome::Render)
    }
}

impl IntoActionResult for bool {
    fn into_action_result(self) -> HandlerResult {
        Ok(self.into())
    }
}

impl IntoActionResult for ActionOutcome {
    fn into_action_result(self) -> HandlerResult {
        Ok(self)
    }
}

impl<T, E> IntoActionResult for Result<T, E>
where
    T: Into<ActionOutcome>,
    E: Into<anyhow::Error>,
{
    fn into_action_result(self) -> HandlerResult {
        self.map(Into::into).map_err(Into::into)
    }
}

/// Per-request information handed to actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Filtered controller name (e.g. `"blog"`).
    pub controller: String,
    /// Filtered action name (e.g. `"post"`).
    pub action: String,
    /// Extra path segments, decoded but not filtered.
    pub flags: BTreeSet<String>,
}

impl RequestContext {
    /// Returns `true` if `name` was passed as a flag.
    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.contains(name)
    }
}

impl From<Route> for RequestContext {
    fn from(route: Route) -> Self {
        Self {
            controller: route.controller,
            action: route.action,
            flags: route.flags,
        }
    }
}

/// A controller instance.
///
/// `operation` is the operation identifier (`"{action}Action"`). The
/// dispatcher only calls operations the controller was registered with.
pub trait Controller {
    /// Runs the named operation.
    fn call(&mut self, operation: &str, ctx: &mut RequestContext) -> HandlerResult;
}

/// A controller that can be registered by type.
pub trait ControllerType: Controller + 'static {
    /// Handler identifier, e.g. `"IndexController"`.
    const NAME: &'static str;
    /// Operation identifiers this controller exposes, e.g. `["indexAction"]`.
    const ACTIONS: &'static [&'static str];

    /// Builds the controller for one request.
    fn new(view: Renderer) -> Self;
}

/// Handler identifier for a controller name: first letter uppercased, then
/// `Controller`.
///
/// ```rust
/// assert_eq!(waypost_dispatch::handler_identifier("blog"), "BlogController");
/// ```
pub fn handler_identifier(controller: &str) -> String {
    let mut chars = controller.chars();
    match chars.next() {
        Some(first) => format!("{}{}Controller", first.to_uppercase(), chars.as_str()),
        None => "Controller".to_string(),
    }
}

/// Operation identifier for an action name: lowercased, then `Action`.
///
/// ```rust
/// assert_eq!(waypost_dispatch::operation_identifier("Post"), "postAction");
/// ```
pub fn operation_identifier(action: &str) -> String {
    format!("{}Action", action.to_lowercase())
}
