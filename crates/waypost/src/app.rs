//! Request bootstrap.
//!
//! [`App`] turns [`Settings`] and a set of controller registrations into one
//! [`Response`] per request. Each call to [`App::handle`] builds a fresh
//! renderer and dispatcher, so nothing from one request leaks into the next.
//!
//! Dispatch failures become a bare 404 page unless debug mode is on, in which
//! case they are returned to the caller.

use std::fmt;
use std::io::{self, Write};
use std::path::Path;

use waypost_dispatch::{
    ControllerRegistry, ControllerType, DispatchError, Dispatcher, RequestSource,
};
use waypost_render::{RenderError, Renderer, SharedBuffer};

use crate::config::{ConfigError, Settings};
use crate::controllers::IndexController;

/// Body of the page served when dispatch fails outside debug mode.
pub const NOT_FOUND_BODY: &str = "<h1>404 NOT FOUND</h1>";

/// Errors surfaced by [`App`].
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The view directories or layout could not be set up.
    #[error("failed to set up views: {0}")]
    Views(#[from] RenderError),

    /// Dispatch failed and debug mode asked for the error.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The rendered response could not be written out.
    #[error("failed to write response: {0}")]
    Output(#[source] RenderError),
}

/// A finished response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: 404,
            body: NOT_FOUND_BODY.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn status_line(&self) -> &'static str {
        match self.status {
            200 => "200 OK",
            404 => "404 NOT FOUND",
            _ => "500 INTERNAL SERVER ERROR",
        }
    }

    /// Writes the response as CGI output: headers, blank line, body.
    pub fn write_cgi(&self, out: &mut impl Write) -> io::Result<()> {
        write!(
            out,
            "Status: {}\r\nContent-Type: text/html; charset=utf-8\r\n\r\n{}",
            self.status_line(),
            self.body
        )?;
        out.flush()
    }
}

type Registration = Box<dyn Fn(&mut ControllerRegistry, &Path)>;

/// Settings plus controller registrations.
pub struct App {
    settings: Settings,
    registrations: Vec<Registration>,
}

impl App {
    /// Creates an app with [`IndexController`] registered.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            registrations: Vec::new(),
        }
        .controller::<IndexController>()
    }

    /// Loads settings from a TOML file.
    pub fn from_config(path: impl AsRef<Path>) -> Result<Self, AppError> {
        Ok(Self::new(Settings::load(path)?))
    }

    /// Registers a controller under the configured controller directory.
    pub fn controller<C: ControllerType>(mut self) -> Self {
        self.registrations
            .push(Box::new(|registry: &mut ControllerRegistry, root: &Path| {
                registry.register::<C>(root);
            }));
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Builds a renderer from the settings.
    pub fn renderer(&self) -> Result<Renderer, RenderError> {
        let view = Renderer::new();
        view.configure_directories(self.settings.layout_path(), self.settings.script_path())?;
        view.set_layout(self.settings.layout())?;
        view.set_base_url(&self.settings.base_url);
        Ok(view)
    }

    /// Builds a dispatcher over a fresh registry, wired to `view`.
    pub fn dispatcher(&self, view: Renderer) -> Dispatcher {
        let root = self.settings.controller_path();
        let mut registry = ControllerRegistry::new();
        for register in &self.registrations {
            register(&mut registry, &root);
        }

        let mut dispatcher = Dispatcher::new(registry);
        dispatcher
            .configure(root, view)
            .set_query_param(self.settings.query_param.clone())
            .set_view_extension(self.settings.view_extension.clone());
        dispatcher
    }

    /// Handles one request.
    ///
    /// # Errors
    ///
    /// - [`AppError::Views`] if the view directories or layout are unusable
    /// - [`AppError::Dispatch`] in debug mode when dispatch fails
    /// - [`AppError::Output`] if the rendered body cannot be flushed
    pub fn handle(&self, request: &impl RequestSource) -> Result<Response, AppError> {
        let body = SharedBuffer::new();
        let view = self.renderer()?;
        view.set_output(body.clone());

        let result = self.dispatcher(view.clone()).run(request);
        flush_output(&view)?;

        match result {
            Ok(()) => Ok(Response::ok(body.take())),
            Err(err) if self.settings.debug => Err(err.into()),
            Err(err) => {
                tracing::warn!(error = %err, "dispatch failed, answering 404");
                Ok(Response::not_found())
            }
        }
    }
}

fn flush_output(view: &Renderer) -> Result<(), AppError> {
    view.flush().map_err(AppError::Output)
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("settings", &self.settings)
            .field("registrations", &self.registrations.len())
            .finish()
    }
}
