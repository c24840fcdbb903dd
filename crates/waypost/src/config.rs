//! Application settings.
//!
//! Settings come from a TOML file. Every key is optional; missing keys take
//! the conventional layout:
//!
//! ```toml
//! base_path = "."
//! layout_dir = "app/views/layouts"
//! script_dir = "app/views/scripts"
//! controller_dir = "app/controllers"
//! layout = "default.jinja"        # "" disables the layout
//! base_url = ""
//! query_param = "q"
//! view_extension = "jinja"
//! debug = false
//! ```
//!
//! Relative directories resolve against `base_path`. A relative `base_path`
//! in a file resolves against the directory holding that file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors loading settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Root every relative directory is resolved against.
    pub base_path: PathBuf,
    pub layout_dir: PathBuf,
    pub script_dir: PathBuf,
    pub controller_dir: PathBuf,
    /// Layout relative to `layout_dir`. Empty means no layout.
    pub layout: String,
    pub base_url: String,
    /// Query parameter that carries the request path.
    pub query_param: String,
    /// Extension of automatically rendered views.
    pub view_extension: String,
    /// Propagate dispatch errors instead of answering 404.
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            layout_dir: PathBuf::from("app/views/layouts"),
            script_dir: PathBuf::from("app/views/scripts"),
            controller_dir: PathBuf::from("app/controllers"),
            layout: "default.jinja".to_string(),
            base_url: String::new(),
            query_param: waypost_dispatch::DEFAULT_QUERY_PARAM.to_string(),
            view_extension: waypost_dispatch::DEFAULT_VIEW_EXTENSION.to_string(),
            debug: false,
        }
    }
}

impl Settings {
    /// Default settings rooted at `base_path`.
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// Loads settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings: Settings =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if settings.base_path.is_relative() {
            if let Some(dir) = path.parent() {
                settings.base_path = dir.join(&settings.base_path);
            }
        }
        tracing::debug!(config = %path.display(), base_path = %settings.base_path.display(), "loaded settings");
        Ok(settings)
    }

    /// Resolves `path` against `base_path` unless it is absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }

    pub fn layout_path(&self) -> PathBuf {
        self.resolve(&self.layout_dir)
    }

    pub fn script_path(&self) -> PathBuf {
        self.resolve(&self.script_dir)
    }

    pub fn controller_path(&self) -> PathBuf {
        self.resolve(&self.controller_dir)
    }

    /// The configured layout, if any.
    pub fn layout(&self) -> Option<&str> {
        let layout = self.layout.trim();
        (!layout.is_empty()).then_some(layout)
    }
}
