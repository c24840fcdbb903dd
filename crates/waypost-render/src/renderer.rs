//! The view renderer.
//!
//! [`Renderer`] owns the template variables, the layout and script directory
//! roots, the active layout and the output stack. It is a cheap, cloneable
//! handle: the dispatcher, every controller and the template helpers all
//! share one instance per request.
//!
//! # Rendering
//!
//! ```text
//! render("index/index.jinja")
//!   → layout file gone?  warn and render without it
//!   → evaluate scripts/index/index.jinja   (captured)  → variables["content"]
//!   → evaluate layouts/default.jinja       (reads content)
//!   → emit to the sink, or return the text
//! ```
//!
//! Without a layout the script output is emitted or returned verbatim.
//!
//! # Example
//!
//! ```rust,ignore
//! use waypost_render::Renderer;
//!
//! let view = Renderer::new();
//! view.configure_directories("app/views/layouts", "app/views/scripts")?
//!     .set_layout(Some("default.jinja"))?;
//! view.set("user", "ada");
//! let html = view.render_to_string("index/index.jinja")?;
//! ```

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde_json::Value;

use crate::engine::{MiniJinjaEngine, TemplateEngine, ViewFile};
use crate::error::RenderError;
use crate::output::{Capture, OutputStack};
use crate::path::{normalize_slashes, SlashMode};
use crate::variables::{Variables, CONTENT_KEY};

/// Where rendered text goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RenderMode {
    /// Write into the current output position.
    Emit,
    /// Capture and hand the text back to the caller.
    Return,
}

/// Shared handle to the view layer of one request.
#[derive(Clone)]
pub struct Renderer {
    inner: Arc<Inner>,
}

struct Inner {
    engine: Box<dyn TemplateEngine>,
    state: Mutex<State>,
    output: OutputStack,
}

#[derive(Debug, Default)]
struct State {
    variables: Variables,
    layout_dir: Option<PathBuf>,
    script_dir: Option<PathBuf>,
    /// Normalised (leading slash) layout name.
    layout: Option<String>,
    base_url: String,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    /// Creates a renderer that evaluates views with MiniJinja and emits to
    /// standard output. No directories and no layout are configured.
    pub fn new() -> Self {
        Self::with_engine(Box::new(MiniJinjaEngine::new()))
    }

    /// Creates a renderer with a custom template engine.
    pub fn with_engine(engine: Box<dyn TemplateEngine>) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                state: Mutex::new(State::default()),
                output: OutputStack::default(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Sets the directory layouts are loaded from.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::DirectoryError`] if `dir` is not an existing,
    /// readable directory.
    pub fn set_layout_directory(&self, dir: impl AsRef<Path>) -> Result<&Self, RenderError> {
        let dir = readable_dir(dir.as_ref())?;
        self.state().layout_dir = Some(dir);
        Ok(self)
    }

    /// Sets the directory view scripts and partials are loaded from.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::DirectoryError`] if `dir` is not an existing,
    /// readable directory.
    pub fn set_script_directory(&self, dir: impl AsRef<Path>) -> Result<&Self, RenderError> {
        let dir = readable_dir(dir.as_ref())?;
        self.state().script_dir = Some(dir);
        Ok(self)
    }

    /// Sets both directory roots.
    pub fn configure_directories(
        &self,
        layout_dir: impl AsRef<Path>,
        script_dir: impl AsRef<Path>,
    ) -> Result<&Self, RenderError> {
        self.set_layout_directory(layout_dir)?
            .set_script_directory(script_dir)
    }

    /// The configured layout directory.
    pub fn layout_directory(&self) -> Option<PathBuf> {
        self.state().layout_dir.clone()
    }

    /// The configured script directory.
    pub fn script_directory(&self) -> Option<PathBuf> {
        self.state().script_dir.clone()
    }

    /// Selects the layout that wraps rendered scripts, relative to the layout
    /// directory. `None` disables wrapping.
    ///
    /// # Errors
    ///
    /// - [`RenderError::MissingDirectory`] if no layout directory is set
    /// - [`RenderError::LayoutNotFound`] if the file is missing or unreadable
    pub fn set_layout(&self, layout: Option<&str>) -> Result<&Self, RenderError> {
        let Some(layout) = layout else {
            self.state().layout = None;
            return Ok(self);
        };

        let normalized = normalize_slashes(layout, SlashMode::Leading);
        let mut state = self.state();
        let dir = state
            .layout_dir
            .clone()
            .ok_or(RenderError::MissingDirectory("layout"))?;
        let file = ViewFile::resolve(&dir, &normalized);
        if normalized.is_empty() || !readable_file(&file.path) {
            return Err(RenderError::LayoutNotFound(file.path));
        }
        state.layout = Some(normalized);
        Ok(self)
    }

    /// The active layout, relative to the layout directory, without a
    /// leading slash.
    pub fn layout(&self) -> Option<String> {
        self.state()
            .layout
            .as_deref()
            .map(|l| l.trim_start_matches('/').to_string())
    }

    /// Replaces the sink that [`render`](Self::render) emits into.
    pub fn set_output(&self, sink: impl Write + Send + 'static) -> &Self {
        self.inner.output.replace_sink(Box::new(sink));
        self
    }

    /// Sets the site's base URL.
    pub fn set_base_url(&self, url: &str) -> &Self {
        self.state().base_url = normalize_slashes(url, SlashMode::Leading);
        self
    }

    /// Joins the base URL with `suffix`. An empty result becomes `"/"`.
    ///
    /// ```rust
    /// use waypost_render::Renderer;
    ///
    /// let view = Renderer::new();
    /// assert_eq!(view.base_url(""), "/");
    /// view.set_base_url("/root/");
    /// assert_eq!(view.base_url("/x"), "/root/x");
    /// assert_eq!(view.base_url("css/site.css"), "/root/css/site.css");
    /// ```
    pub fn base_url(&self, suffix: &str) -> String {
        let url = format!(
            "{}{}",
            self.state().base_url,
            normalize_slashes(suffix, SlashMode::Leading)
        );
        if url.is_empty() {
            "/".to_string()
        } else {
            url
        }
    }

    // ------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------

    /// Returns a copy of the value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.state().variables.get(name).cloned()
    }

    /// Binds `name` to `value`.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) -> &Self {
        self.state().variables.set(name, value);
        self
    }

    /// Returns `true` if `name` is bound to a non-null value.
    pub fn has(&self, name: &str) -> bool {
        self.state().variables.has(name)
    }

    /// Removes the binding for `name`.
    pub fn remove(&self, name: &str) -> Option<Value> {
        self.state().variables.remove(name)
    }

    /// Deep-merges every field of `data` into the variables.
    ///
    /// See [`Variables::merge`] for how collisions combine.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::VariableError`] if `data` is not map-like.
    pub fn set_variables<T: Serialize>(&self, data: &T) -> Result<&Self, RenderError> {
        let incoming = Variables::from_serialize(data)?;
        self.state().variables.merge(incoming.into_map());
        Ok(self)
    }

    /// Snapshot of the current variables.
    pub fn to_map(&self) -> Variables {
        self.state().variables.clone()
    }

    /// Removes every variable.
    pub fn clear(&self) -> &Self {
        self.state().variables.clear();
        self
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    /// Writes `text` at the current output position.
    pub fn emit(&self, text: &str) -> Result<(), RenderError> {
        Ok(self.inner.output.emit(text)?)
    }

    /// Opens a capture region on the output stack.
    pub fn capture(&self) -> Capture<'_> {
        self.inner.output.capture()
    }

    /// Flushes the output sink.
    pub fn flush(&self) -> Result<(), RenderError> {
        Ok(self.inner.output.flush()?)
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Renders `script` (relative to the script directory), wrapped in the
    /// active layout, into the output sink.
    ///
    /// # Errors
    ///
    /// - [`RenderError::MissingDirectory`] if no script directory is set
    /// - [`RenderError::ScriptNotFound`] if the script does not exist
    /// - [`RenderError::TemplateError`] if evaluation fails
    pub fn render(&self, script: &str) -> Result<(), RenderError> {
        self.render_view(script, RenderMode::Emit).map(|_| ())
    }

    /// Renders like [`render`](Self::render) but returns the text instead of
    /// emitting it.
    pub fn render_to_string(&self, script: &str) -> Result<String, RenderError> {
        self.render_view(script, RenderMode::Return)
    }

    fn render_view(&self, script: &str, mode: RenderMode) -> Result<String, RenderError> {
        let layout = self.active_layout()?;
        let script = self.script_file(script)?;

        let content = self.evaluate_captured(&script)?;
        self.set(CONTENT_KEY, content.clone());

        match (layout, mode) {
            (Some(layout), RenderMode::Emit) => {
                self.evaluate(&layout)?;
                Ok(String::new())
            }
            (Some(layout), RenderMode::Return) => self.evaluate_captured(&layout),
            (None, RenderMode::Emit) => {
                self.emit(&content)?;
                Ok(String::new())
            }
            (None, RenderMode::Return) => Ok(content),
        }
    }

    /// Renders a script with `variables` as its entire scope, without a
    /// layout. The previous variables are restored afterwards, whether or not
    /// evaluation succeeded.
    pub(crate) fn render_partial(
        &self,
        script: &str,
        variables: Variables,
        mode: RenderMode,
    ) -> Result<String, RenderError> {
        let script = self.script_file(script)?;
        let _scope = ScopeSwap::enter(self, variables);

        match mode {
            RenderMode::Emit => {
                self.evaluate(&script)?;
                Ok(String::new())
            }
            RenderMode::Return => self.evaluate_captured(&script),
        }
    }

    /// Resolves the active layout, demoting a vanished layout file to "no
    /// layout".
    fn active_layout(&self) -> Result<Option<ViewFile>, RenderError> {
        let mut state = self.state();
        let Some(name) = state.layout.clone() else {
            return Ok(None);
        };
        let dir = state
            .layout_dir
            .clone()
            .ok_or(RenderError::MissingDirectory("layout"))?;

        let file = ViewFile::resolve(&dir, &name);
        if !file.path.is_file() {
            tracing::warn!(
                layout = %file.path.display(),
                "layout no longer exists, rendering without it"
            );
            state.layout = None;
            return Ok(None);
        }
        Ok(Some(file))
    }

    fn script_file(&self, script: &str) -> Result<ViewFile, RenderError> {
        let dir = self
            .state()
            .script_dir
            .clone()
            .ok_or(RenderError::MissingDirectory("script"))?;
        let file = ViewFile::resolve(&dir, &normalize_slashes(script, SlashMode::Leading));
        if !file.path.is_file() {
            return Err(RenderError::ScriptNotFound(file.path));
        }
        Ok(file)
    }

    /// Evaluates `file` at the current output position.
    fn evaluate(&self, file: &ViewFile) -> Result<(), RenderError> {
        let scope = self.to_map();
        tracing::debug!(view = %file.name, "evaluating view");
        let mut out = self.inner.output.writer();
        self.inner.engine.evaluate(file, &scope, self, &mut out)
    }

    /// Evaluates `file` inside its own capture region and returns the text.
    fn evaluate_captured(&self, file: &ViewFile) -> Result<String, RenderError> {
        let capture = self.capture();
        self.evaluate(file)?;
        Ok(capture.finish())
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("state", &*self.state())
            .field("output", &self.inner.output)
            .finish_non_exhaustive()
    }
}

/// Swaps the renderer's variables for the lifetime of the guard.
struct ScopeSwap<'a> {
    renderer: &'a Renderer,
    saved: Option<Variables>,
}

impl<'a> ScopeSwap<'a> {
    fn enter(renderer: &'a Renderer, variables: Variables) -> Self {
        let saved = std::mem::replace(&mut renderer.state().variables, variables);
        Self {
            renderer,
            saved: Some(saved),
        }
    }
}

impl Drop for ScopeSwap<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.renderer.state().variables = saved;
        }
    }
}

fn readable_dir(dir: &Path) -> Result<PathBuf, RenderError> {
    if dir.is_dir() && std::fs::read_dir(dir).is_ok() {
        Ok(dir.to_path_buf())
    } else {
        Err(RenderError::DirectoryError(dir.to_path_buf()))
    }
}

fn readable_file(path: &Path) -> bool {
    path.is_file() && std::fs::File::open(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::SharedBuffer;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        layouts: PathBuf,
        scripts: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let layouts = tmp.path().join("layouts");
            let scripts = tmp.path().join("scripts");
            fs::create_dir_all(&layouts).unwrap();
            fs::create_dir_all(&scripts).unwrap();
            Self {
                _tmp: tmp,
                layouts,
                scripts,
            }
        }

        fn script(&self, name: &str, source: &str) -> &Self {
            let path = self.scripts.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, source).unwrap();
            self
        }

        fn layout(&self, name: &str, source: &str) -> &Self {
            fs::write(self.layouts.join(name), source).unwrap();
            self
        }

        fn renderer(&self) -> Renderer {
            let view = Renderer::new();
            view.configure_directories(&self.layouts, &self.scripts)
                .unwrap();
            view
        }
    }

    #[test]
    fn test_directory_must_exist() {
        let view = Renderer::new();
        let err = view
            .set_script_directory("/definitely/not/here")
            .unwrap_err();
        assert!(matches!(err, RenderError::DirectoryError(_)));
        assert!(view.script_directory().is_none());
    }

    #[test]
    fn test_directory_must_be_a_directory() {
        let fx = Fixture::new();
        fx.script("file.jinja", "x");
        let err = Renderer::new()
            .set_layout_directory(fx.scripts.join("file.jinja"))
            .unwrap_err();
        assert!(matches!(err, RenderError::DirectoryError(_)));
    }

    #[test]
    fn test_set_layout_requires_existing_file() {
        let fx = Fixture::new();
        let view = fx.renderer();
        let err = view.set_layout(Some("missing.jinja")).unwrap_err();
        assert!(matches!(err, RenderError::LayoutNotFound(_)));
        assert!(view.layout().is_none());
    }

    #[test]
    fn test_set_layout_normalizes_name() {
        let fx = Fixture::new();
        fx.layout("default.jinja", "{{ content }}");
        let view = fx.renderer();
        view.set_layout(Some("./default.jinja")).unwrap();
        assert_eq!(view.layout().as_deref(), Some("default.jinja"));
        view.set_layout(None).unwrap();
        assert!(view.layout().is_none());
    }

    #[test]
    fn test_set_layout_without_directory() {
        let err = Renderer::new()
            .set_layout(Some("default.jinja"))
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingDirectory("layout")));
    }

    #[test]
    fn test_render_without_script_directory() {
        let err = Renderer::new().render_to_string("index.jinja").unwrap_err();
        assert!(matches!(err, RenderError::MissingDirectory("script")));
    }

    #[test]
    fn test_render_missing_script() {
        let fx = Fixture::new();
        let err = fx.renderer().render_to_string("nope/nope.jinja").unwrap_err();
        match err {
            RenderError::ScriptNotFound(path) => {
                assert!(path.ends_with("nope/nope.jinja"));
            }
            other => panic!("expected ScriptNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_render_without_layout_returns_script_output() {
        let fx = Fixture::new();
        fx.script("index/index.jinja", "Hello {{ name }}!");
        let view = fx.renderer();
        view.set("name", "ada");
        assert_eq!(view.render_to_string("index/index.jinja").unwrap(), "Hello ada!");
    }

    #[test]
    fn test_render_with_layout_wraps_content() {
        let fx = Fixture::new();
        fx.script("index/index.jinja", "<p>{{ name }}</p>")
            .layout("default.jinja", "<main>{{ content }}</main>");
        let view = fx.renderer();
        view.set_layout(Some("default.jinja")).unwrap();
        view.set("name", "ada");

        let html = view.render_to_string("index/index.jinja").unwrap();
        assert_eq!(html, "<main><p>ada</p></main>");
        assert_eq!(view.get(CONTENT_KEY), Some(json!("<p>ada</p>")));
    }

    #[test]
    fn test_render_emits_into_sink() {
        let fx = Fixture::new();
        fx.script("index/index.jinja", "body")
            .layout("default.jinja", "[{{ content }}]");
        let sink = SharedBuffer::new();
        let view = fx.renderer();
        view.set_output(sink.clone());
        view.set_layout(Some("default.jinja")).unwrap();

        view.render("index/index.jinja").unwrap();
        assert_eq!(sink.contents(), "[body]");
    }

    #[test]
    fn test_vanished_layout_degrades_to_script_output() {
        let fx = Fixture::new();
        fx.script("index/index.jinja", "just the script")
            .layout("default.jinja", "<main>{{ content }}</main>");
        let view = fx.renderer();
        view.set_layout(Some("default.jinja")).unwrap();
        fs::remove_file(fx.layouts.join("default.jinja")).unwrap();

        let out = view.render_to_string("index/index.jinja").unwrap();
        assert_eq!(out, "just the script");
        assert!(view.layout().is_none());
    }

    #[test]
    fn test_template_error_leaves_output_stack_clean() {
        let fx = Fixture::new();
        fx.script("broken.jinja", "{{ unclosed")
            .script("ok.jinja", "fine");
        let sink = SharedBuffer::new();
        let view = fx.renderer();
        view.set_output(sink.clone());

        let err = view.render("broken.jinja").unwrap_err();
        assert!(matches!(err, RenderError::TemplateError(_)));
        assert_eq!(view.inner.output.depth(), 0);

        view.render("ok.jinja").unwrap();
        assert_eq!(sink.contents(), "fine");
    }

    #[test]
    fn test_partial_swaps_scope() {
        let fx = Fixture::new();
        fx.script("item.jinja", "{{ label }}/{{ title }}");
        let view = fx.renderer();
        view.set("title", "outer");

        let mut scope = Variables::new();
        scope.set("label", "inner");
        let out = view
            .render_partial("item.jinja", scope, RenderMode::Return)
            .unwrap();

        assert_eq!(out, "inner/");
        assert_eq!(view.get("title"), Some(json!("outer")));
        assert!(!view.has("label"));
    }

    #[test]
    fn test_partial_emit_writes_to_sink() {
        let fx = Fixture::new();
        fx.script("item.jinja", "<{{ label }}>");
        let sink = SharedBuffer::new();
        let view = fx.renderer();
        view.set_output(sink.clone());

        let mut scope = Variables::new();
        scope.set("label", "inner");
        let out = view
            .render_partial("item.jinja", scope, RenderMode::Emit)
            .unwrap();

        assert_eq!(out, "");
        assert_eq!(sink.contents(), "<inner>");
        assert!(!view.has("label"));
    }

    #[test]
    fn test_partial_restores_scope_on_error() {
        let fx = Fixture::new();
        fx.script("broken.jinja", "{% for %}");
        let view = fx.renderer();
        view.set("title", "outer")
            .set("tags", json!(["a", "b"]))
            .set("user", json!({"name": "ada"}));
        let before = view.to_map();

        let mut scope = Variables::new();
        scope.set("title", "inner");
        let result = view.render_partial("broken.jinja", scope, RenderMode::Return);

        assert!(result.is_err());
        assert_eq!(view.to_map(), before);
        assert_eq!(view.inner.output.depth(), 0);
    }

    #[test]
    fn test_partial_missing_script_keeps_scope() {
        let fx = Fixture::new();
        let view = fx.renderer();
        view.set("title", "outer");
        let before = view.to_map();

        let err = view
            .render_partial("missing.jinja", Variables::new(), RenderMode::Return)
            .unwrap_err();
        assert!(matches!(err, RenderError::ScriptNotFound(_)));
        assert_eq!(view.to_map(), before);
    }

    #[test]
    fn test_set_variables_merges() {
        let view = Renderer::new();
        view.set("tags", json!(["a"]));
        view.set_variables(&json!({"tags": ["b"], "title": "Home"}))
            .unwrap();
        assert_eq!(view.get("tags"), Some(json!(["a", "b"])));
        assert_eq!(view.get("title"), Some(json!("Home")));
    }

    #[test]
    fn test_clear_and_remove() {
        let view = Renderer::new();
        view.set("a", 1).set("b", 2);
        assert_eq!(view.remove("a"), Some(json!(1)));
        assert!(view.get("a").is_none());
        view.clear();
        assert!(view.to_map().is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let view = Renderer::new();
        let other = view.clone();
        other.set("shared", true);
        assert_eq!(view.get("shared"), Some(json!(true)));
    }

    #[test]
    fn test_base_url() {
        let view = Renderer::new();
        assert_eq!(view.base_url(""), "/");
        assert_eq!(view.base_url("/x"), "/x");
        view.set_base_url("/root");
        assert_eq!(view.base_url(""), "/root");
        assert_eq!(view.base_url("/x"), "/root/x");
        assert_eq!(view.base_url("x/"), "/root/x");
    }
}
