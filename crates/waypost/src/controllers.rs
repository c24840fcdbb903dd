//! Built-in controllers.

use waypost_dispatch::{
    Controller, ControllerType, HandlerResult, IntoActionResult, RequestContext,
};
use waypost_render::Renderer;

/// The default controller. Its `index` action renders `index/index.{ext}`
/// with nothing but the page title set.
#[derive(Debug)]
pub struct IndexController {
    view: Renderer,
}

impl IndexController {
    /// The renderer this controller was built with.
    pub fn view(&self) -> &Renderer {
        &self.view
    }

    fn index(&mut self) {}
}

impl Controller for IndexController {
    fn call(&mut self, operation: &str, _ctx: &mut RequestContext) -> HandlerResult {
        match operation {
            "indexAction" => self.index().into_action_result(),
            other => Err(anyhow::anyhow!("{} does not handle {}", Self::NAME, other)),
        }
    }
}

impl ControllerType for IndexController {
    const NAME: &'static str = "IndexController";
    const ACTIONS: &'static [&'static str] = &["indexAction"];

    fn new(view: Renderer) -> Self {
        Self { view }
    }
}
