//! # Waypost - A Minimal Front Controller
//!
//! `waypost` maps a request path to a controller action and renders the
//! action's view inside a layout.
//!
//! ```text
//! /blog/post/draft
//!   → BlogController::postAction   (flags: draft, title: "blog/post")
//!   → scripts/blog/post.jinja      (rendered into `content`)
//!   → layouts/default.jinja        (response body)
//! ```
//!
//! This crate wires the two halves together:
//!
//! - [`waypost_render`] (re-exported as [`render`]): views, layouts, partials
//! - [`waypost_dispatch`] (re-exported as [`dispatch`]): routing and controllers
//!
//! and adds [`Settings`] loaded from TOML, the request bootstrap ([`App`])
//! with its 404 fallback, log setup, and the default [`IndexController`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use waypost::{App, CgiRequest, Settings};
//!
//! let app = App::new(Settings::with_base_path("/srv/site"))
//!     .controller::<BlogController>();
//! let response = app.handle(&CgiRequest::from_env())?;
//! response.write_cgi(&mut std::io::stdout())?;
//! ```
//!
//! ## Writing Controllers
//!
//! ```rust
//! use waypost::{Controller, ControllerType, HandlerResult, IntoActionResult, Renderer, RequestContext};
//!
//! pub struct BlogController {
//!     view: Renderer,
//! }
//!
//! impl Controller for BlogController {
//!     fn call(&mut self, operation: &str, ctx: &mut RequestContext) -> HandlerResult {
//!         match operation {
//!             "postAction" => {
//!                 self.view.set("draft", ctx.has_flag("draft"));
//!                 ().into_action_result()
//!             }
//!             other => Err(anyhow::anyhow!("unknown operation {}", other)),
//!         }
//!     }
//! }
//!
//! impl ControllerType for BlogController {
//!     const NAME: &'static str = "BlogController";
//!     const ACTIONS: &'static [&'static str] = &["postAction"];
//!
//!     fn new(view: Renderer) -> Self {
//!         Self { view }
//!     }
//! }
//! ```

mod app;
mod config;
mod controllers;
pub mod logging;

pub use waypost_dispatch as dispatch;
pub use waypost_render as render;

pub use app::{App, AppError, Response, NOT_FOUND_BODY};
pub use config::{ConfigError, Settings};
pub use controllers::IndexController;

pub use waypost_dispatch::{
    ActionOutcome, CgiRequest, Controller, ControllerRegistry, ControllerType, DispatchError,
    Dispatcher, HandlerResult, IntoActionResult, Request, RequestContext, RequestSource,
};
pub use waypost_render::{RenderError, Renderer, Variables};
