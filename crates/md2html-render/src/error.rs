//! Render error type.

use std::path::PathBuf;

use md2html_cache::CacheError;

/// Error produced while rendering or writing a page.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Template failed to parse or render.
    #[error("Template error in '{name}': {source}")]
    Template {
        /// Template path or built-in template name.
        name: String,
        #[source]
        source: minijinja::Error,
    },
    /// Template or stylesheet could not be read.
    #[error(transparent)]
    Cache(#[from] CacheError),
    /// Output file could not be written.
    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A location could not be made relative to a page.
    #[error("Invalid location: {0}")]
    Location(String),
}
