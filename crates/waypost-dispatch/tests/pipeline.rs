//! Request-to-response tests: routing, controllers, layouts and views together.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use waypost_dispatch::{
    CgiRequest, Controller, ControllerRegistry, ControllerType, DispatchError, Dispatcher,
    HandlerResult, IntoActionResult, Request, RequestContext,
};
use waypost_render::{Renderer, SharedBuffer};

struct BlogController {
    view: Renderer,
}

impl BlogController {
    fn post(&mut self, ctx: &RequestContext) {
        self.view
            .set("draft", ctx.has_flag("draft"))
            .set("tags", serde_json::json!(["rust", "web"]));
    }

    fn feed(&mut self) -> Result<bool, std::io::Error> {
        self.view
            .emit("<rss/>")
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(false)
    }

    fn teaser(&mut self) -> anyhow::Result<bool> {
        let html = self.view.render_to_string("blog/teaser.jinja")?;
        self.view.emit(&format!("<aside>{}</aside>", html))?;
        Ok(false)
    }
}

impl Controller for BlogController {
    fn call(&mut self, operation: &str, ctx: &mut RequestContext) -> HandlerResult {
        match operation {
            "postAction" => self.post(ctx).into_action_result(),
            "feedAction" => self.feed().into_action_result(),
            "teaserAction" => self.teaser().into_action_result(),
            other => Err(anyhow::anyhow!("unexpected operation {}", other)),
        }
    }
}

impl ControllerType for BlogController {
    const NAME: &'static str = "BlogController";
    const ACTIONS: &'static [&'static str] = &["postAction", "feedAction", "teaserAction"];

    fn new(view: Renderer) -> Self {
        Self { view }
    }
}

struct Site {
    _tmp: TempDir,
    controllers: PathBuf,
    view: Renderer,
    body: SharedBuffer,
}

impl Site {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(root, "views/layouts/default.jinja", "<title>{{ title }}</title><main>{{ content }}</main>");
        write(
            root,
            "views/scripts/blog/post.jinja",
            "{% if draft %}[draft]{% endif %}{% for t in tags %}{{ partial(\"blog/tag.jinja\", {\"name\": t}) }}{% endfor %}",
        );
        write(root, "views/scripts/blog/tag.jinja", "#{{ name }} ");
        write(root, "views/scripts/blog/teaser.jinja", "teaser");

        let view = Renderer::new();
        view.configure_directories(root.join("views/layouts"), root.join("views/scripts"))
            .unwrap()
            .set_layout(Some("default.jinja"))
            .unwrap();
        let body = SharedBuffer::new();
        view.set_output(body.clone());

        Self {
            controllers: root.join("controllers"),
            _tmp: tmp,
            view,
            body,
        }
    }

    fn dispatcher(&self) -> Dispatcher {
        let mut registry = ControllerRegistry::new();
        registry.register::<BlogController>(&self.controllers);
        let mut dispatcher = Dispatcher::new(registry);
        dispatcher.configure(&self.controllers, self.view.clone());
        dispatcher
    }
}

fn write(root: &Path, name: &str, source: &str) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, source).unwrap();
}

#[test]
fn test_action_view_wrapped_in_layout() {
    let site = Site::new();
    site.dispatcher()
        .run(&Request::from_uri("/blog/post/draft"))
        .unwrap();

    assert_eq!(
        site.body.contents(),
        "<title>blog/post</title><main>[draft]#rust #web </main>"
    );
    // Partials left the action's variables alone.
    assert!(!site.view.has("name"));
    assert_eq!(site.view.get("draft"), Some(serde_json::json!(true)));
}

#[test]
fn test_suppressed_action_writes_its_own_output() {
    let site = Site::new();
    site.dispatcher()
        .run(&Request::from_uri("/blog/feed"))
        .unwrap();

    assert_eq!(site.body.contents(), "<rss/>");
}

#[test]
fn test_action_may_render_views_itself() {
    let site = Site::new();
    site.dispatcher()
        .run(&Request::from_uri("/blog/teaser"))
        .unwrap();

    assert_eq!(site.body.contents(), "<aside><title>blog/teaser</title><main>teaser</main></aside>");
}

#[test]
fn test_cgi_request_routing() {
    let site = Site::new();
    let request = CgiRequest::new("/index.cgi?q=%2Fblog%2Ffeed", "q=%2Fblog%2Ffeed");
    site.dispatcher().run(&request).unwrap();

    assert_eq!(site.body.contents(), "<rss/>");
}

#[test]
fn test_missing_controller_writes_nothing() {
    let site = Site::new();
    let err = site
        .dispatcher()
        .run(&Request::from_uri("/shop/cart"))
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(matches!(err, DispatchError::HandlerNotFound { .. }));
    assert_eq!(site.body.contents(), "");
}

#[test]
fn test_one_dispatcher_per_request() {
    let site = Site::new();
    site.dispatcher()
        .run(&Request::from_uri("/blog/feed"))
        .unwrap();

    let mut second = site.dispatcher();
    assert_eq!(second.controller_name(), "index");
    second.run(&Request::from_uri("/blog/feed")).unwrap();
    assert_eq!(second.action_name(), "feed");
    assert_eq!(site.body.contents(), "<rss/><rss/>");
}
