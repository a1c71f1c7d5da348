//! Build error types.

use std::path::PathBuf;

use md2html_cache::CacheError;
use md2html_config::ConfigError;
use md2html_metadata::MetadataError;
use md2html_plugins::PluginError;
use md2html_render::RenderError;

/// Error that aborts a build run.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Plugin configuration, lifecycle or finalization failed.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// Processing one document failed.
    #[error("Error processing '{}': {source}", input.display())]
    Document {
        /// Input file of the document.
        input: PathBuf,
        #[source]
        source: PageError,
    },
}

/// Error raised while a single page is processed.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Read(#[from] CacheError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
