//! Dispatch errors.

use std::path::PathBuf;

use waypost_render::RenderError;

/// Errors raised while resolving, invoking or rendering a request.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The dispatcher is missing its controller root or renderer.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Nothing is registered at the controller's module path.
    #[error("the controller {handler} was not found in the path {}", .path.display())]
    HandlerNotFound { handler: String, path: PathBuf },

    /// A module exists at the path but does not define the expected name.
    #[error("the handler name {handler} does not match the controller defined in {}", .path.display())]
    HandlerMismatch { handler: String, path: PathBuf },

    /// The controller does not expose the requested operation.
    #[error("the action {operation} does not exist in {handler}")]
    OperationNotFound { operation: String, handler: String },

    /// The action itself failed.
    #[error("action failed: {0}")]
    Action(#[source] anyhow::Error),

    /// Rendering the action's view failed.
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
}

impl DispatchError {
    /// Returns `true` for errors that mean "no such page" rather than a
    /// fault in a page that exists.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DispatchError::HandlerNotFound { .. }
                | DispatchError::HandlerMismatch { .. }
                | DispatchError::OperationNotFound { .. }
                | DispatchError::Render(RenderError::ScriptNotFound(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = DispatchError::HandlerNotFound {
            handler: "BlogController".into(),
            path: PathBuf::from("/app/controllers/BlogController"),
        };
        assert_eq!(
            err.to_string(),
            "the controller BlogController was not found in the path /app/controllers/BlogController"
        );

        let err = DispatchError::OperationNotFound {
            operation: "postAction".into(),
            handler: "BlogController".into(),
        };
        assert_eq!(
            err.to_string(),
            "the action postAction does not exist in BlogController"
        );
    }

    #[test]
    fn test_action_error_keeps_source() {
        let err = DispatchError::Action(anyhow::anyhow!("database unavailable"));
        assert_eq!(err.to_string(), "action failed: database unavailable");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_render_error_converts() {
        let err: DispatchError = RenderError::MissingDirectory("script").into();
        assert!(matches!(err, DispatchError::Render(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_is_not_found() {
        let err = DispatchError::Render(RenderError::ScriptNotFound(PathBuf::from("x")));
        assert!(err.is_not_found());
        assert!(!DispatchError::Configuration("x".into()).is_not_found());
    }
}
