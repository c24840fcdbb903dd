//! # Waypost Render - Views, Layouts and Partials
//!
//! `waypost-render` is the view layer of the `waypost` request dispatcher. It
//! evaluates view scripts from a script directory, wraps them in a layout from
//! a layout directory, and writes the result to an output sink or returns it
//! as a string.
//!
//! ## Core Concepts
//!
//! - [`Renderer`]: shared handle holding variables, directories, the active
//!   layout, the base URL and the output stack
//! - [`Variables`]: the explicit key-value scope handed to every view
//! - [`OutputStack`] / [`Capture`]: nested output capture with guaranteed
//!   restoration on error
//! - [`TemplateEngine`]: the seam to the template language ([`MiniJinjaEngine`]
//!   by default)
//!
//! ## Quick Start
//!
//! ```rust
//! use std::fs;
//! use waypost_render::Renderer;
//!
//! let tmp = tempfile::tempdir().unwrap();
//! let layouts = tmp.path().join("layouts");
//! let scripts = tmp.path().join("scripts");
//! fs::create_dir_all(scripts.join("index")).unwrap();
//! fs::create_dir_all(&layouts).unwrap();
//! fs::write(layouts.join("default.jinja"), "<body>{{ content }}</body>").unwrap();
//! fs::write(scripts.join("index/index.jinja"), "Hello {{ name }}").unwrap();
//!
//! let view = Renderer::new();
//! view.configure_directories(&layouts, &scripts).unwrap()
//!     .set_layout(Some("default.jinja")).unwrap();
//! view.set("name", "world");
//!
//! let html = view.render_to_string("index/index.jinja").unwrap();
//! assert_eq!(html, "<body>Hello world</body>");
//! ```
//!
//! ## Partials
//!
//! Inside any view, `partial("shared/item.jinja", {"label": x})` renders
//! another script with only the given variables in scope. The caller's
//! variables are back in place once the partial returns, even if it failed.

mod engine;
mod error;
mod output;
mod path;
mod renderer;
mod variables;

pub use engine::{register_helpers, MiniJinjaEngine, TemplateEngine, ViewFile};
pub use error::RenderError;
pub use output::{Capture, OutputStack, SharedBuffer, StackWriter};
pub use path::{normalize_slashes, SlashMode};
pub use renderer::Renderer;
pub use variables::{Variables, CONTENT_KEY};
