//! Plugin error type.

use std::path::PathBuf;

use md2html_config::ConfigError;
use md2html_render::RenderError;

/// Error produced by plugin configuration or lifecycle hooks.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// Invalid plugin configuration supplied by the user.
    #[error("Plugin '{plugin}': {message}")]
    Config {
        /// Plugin name.
        plugin: String,
        /// What is wrong.
        message: String,
    },
    /// A lifecycle hook was called out of order or more than once.
    #[error("Plugin contract violation: {0}")]
    Contract(String),
    /// A plugin-defined document failed to resolve.
    #[error(transparent)]
    Document(#[from] ConfigError),
    /// Rendering or writing a plugin page failed.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// Reading or writing plugin data failed.
    #[error("{context} '{}': {source}", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Plugin data file is not valid JSON.
    #[error("Invalid JSON in '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PluginError {
    /// Create a configuration error for `plugin`.
    pub fn config(plugin: &str, message: impl Into<String>) -> Self {
        Self::Config {
            plugin: plugin.to_owned(),
            message: message.into(),
        }
    }
}
