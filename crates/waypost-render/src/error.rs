//! Error types for view rendering.
//!
//! This module provides [`RenderError`], the error type for every renderer
//! operation: directory configuration, layout selection and template
//! evaluation. It abstracts over the underlying template engine's errors so
//! the engine can be swapped without touching callers.

use std::fmt;
use std::path::PathBuf;

/// Error type for renderer configuration and rendering.
#[derive(Debug)]
pub enum RenderError {
    /// A layout or script directory does not exist or is not readable.
    DirectoryError(PathBuf),

    /// The requested layout file does not exist under the layout directory.
    LayoutNotFound(PathBuf),

    /// The requested script does not exist under the script directory.
    ScriptNotFound(PathBuf),

    /// A directory required for the operation was never configured.
    MissingDirectory(&'static str),

    /// Template syntax error or evaluation failure.
    TemplateError(String),

    /// Variables could not be converted to or from the template scope.
    VariableError(String),

    /// I/O error while reading a template or writing output.
    IoError(std::io::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::DirectoryError(path) => {
                write!(f, "directory not found or not readable: {}", path.display())
            }
            RenderError::LayoutNotFound(path) => write!(
                f,
                "layout does not exist or is not readable: {}",
                path.display()
            ),
            RenderError::ScriptNotFound(path) => {
                write!(f, "script does not exist: {}", path.display())
            }
            RenderError::MissingDirectory(which) => {
                write!(f, "no {} directory has been configured", which)
            }
            RenderError::TemplateError(msg) => write!(f, "template error: {}", msg),
            RenderError::VariableError(msg) => write!(f, "variable error: {}", msg),
            RenderError::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::IoError(err)
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::VariableError(err.to_string())
    }
}

impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;

        match err.kind() {
            ErrorKind::BadSerialization => RenderError::VariableError(err.to_string()),
            _ => {
                // Keep the chain: errors raised inside partials arrive as sources.
                let mut msg = err.to_string();
                let mut source = std::error::Error::source(&err);
                while let Some(inner) = source {
                    msg.push_str(": ");
                    msg.push_str(&inner.to_string());
                    source = inner.source();
                }
                RenderError::TemplateError(msg)
            }
        }
    }
}

impl From<RenderError> for minijinja::Error {
    fn from(err: RenderError) -> Self {
        minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RenderError::ScriptNotFound(PathBuf::from("/views/scripts/index/missing.jinja"));
        assert!(err.to_string().contains("script does not exist"));
        assert!(err.to_string().contains("missing.jinja"));
    }

    #[test]
    fn test_missing_directory_display() {
        let err = RenderError::MissingDirectory("script");
        assert_eq!(err.to_string(), "no script directory has been configured");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let render_err: RenderError = io_err.into();
        assert!(matches!(render_err, RenderError::IoError(_)));
    }

    #[test]
    fn test_from_minijinja_syntax_error() {
        let mj_err = minijinja::Error::new(minijinja::ErrorKind::SyntaxError, "unexpected end");
        let render_err: RenderError = mj_err.into();
        assert!(matches!(render_err, RenderError::TemplateError(_)));
    }

    #[test]
    fn test_into_minijinja_error() {
        let err: minijinja::Error =
            RenderError::ScriptNotFound(PathBuf::from("/scripts/gone.jinja")).into();
        assert_eq!(err.kind(), minijinja::ErrorKind::InvalidOperation);
        assert!(err.to_string().contains("gone.jinja"));
    }
}
