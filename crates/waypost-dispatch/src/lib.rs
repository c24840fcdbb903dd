//! Path-based request dispatch for `waypost`.
//!
//! `waypost-dispatch` turns a request path like `/blog/post/draft` into a
//! controller (`BlogController`), an operation (`postAction`) and a set of
//! flags (`draft`), runs the operation, and renders `blog/post.jinja` through
//! a [`waypost_render::Renderer`].
//!
//! # Features
//!
//! - **Routing**: positional `/controller/action/flag...` segments with name
//!   filtering ([`filter`], [`Route`])
//! - **Controllers**: [`Controller`] / [`ControllerType`] with a registration
//!   time [`ControllerRegistry`] in place of loading code from disk
//! - **Automatic views**: actions render `{controller}/{action}.{ext}` unless
//!   they return `false` / [`ActionOutcome::Suppress`]
//! - **Request sources**: [`Request`] from a URI, [`CgiRequest`] from the
//!   CGI environment
//!
//! # Usage
//!
//! ```rust,ignore
//! use waypost_dispatch::{CgiRequest, ControllerRegistry, Dispatcher};
//! use waypost_render::Renderer;
//!
//! let view = Renderer::new();
//! view.configure_directories("app/views/layouts", "app/views/scripts")?;
//!
//! let mut registry = ControllerRegistry::new();
//! registry.register::<IndexController>("app/controllers");
//!
//! Dispatcher::new(registry)
//!     .configure("app/controllers", view)
//!     .run(&CgiRequest::from_env())?;
//! ```

mod dispatch;
mod error;
mod handler;
mod registry;
mod request;
mod route;

pub use dispatch::{Dispatcher, DEFAULT_QUERY_PARAM, DEFAULT_VIEW_EXTENSION, TITLE_KEY};
pub use error::DispatchError;
pub use handler::{
    handler_identifier, operation_identifier, ActionOutcome, Controller, ControllerType,
    HandlerResult, IntoActionResult, RequestContext,
};
pub use registry::{ControllerDef, ControllerFactory, ControllerModule, ControllerRegistry};
pub use request::{CgiRequest, Request, RequestSource};
pub use route::{filter, strip_query, url_decode, Route, DEFAULT_NAME};
