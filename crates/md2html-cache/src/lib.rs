//! Source file content cache for md2html.
//!
//! A build run reads the same files many times: templates are shared by
//! every page, included snippets repeat across pages and CSS files are
//! inlined into each page. [`ContentCache`] reads each path once and serves
//! later reads from memory.
//!
//! # Implementations
//!
//! - [`FileContentCache`]: reads from disk, caches for the lifetime of the value
//! - [`MemoryContentCache`]: serves preloaded content, never touches the disk
//!
//! Entries are never invalidated, so a cache must not outlive the run that
//! created it.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use md2html_cache::{ContentCache, MemoryContentCache};
//!
//! let cache = MemoryContentCache::new().with_file("intro.md", "# Intro");
//! assert_eq!(&*cache.read(Path::new("intro.md")).unwrap(), "# Intro");
//! assert!(cache.read(Path::new("missing.md")).unwrap_err().is_not_found());
//! ```

mod file;
mod memory;

use std::path::{Path, PathBuf};
use std::rc::Rc;

pub use file::FileContentCache;
pub use memory::MemoryContentCache;

/// Read-through text cache keyed by path.
pub trait ContentCache {
    /// Read the text content of `path`.
    ///
    /// Returns [`CacheError::NotFound`] when the file does not exist so
    /// callers can report a missing include differently from an I/O failure.
    fn read(&self, path: &Path) -> Result<Rc<str>, CacheError>;
}

/// Error reading a file through a [`ContentCache`].
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The file does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    /// The file exists but could not be read.
    #[error("Error reading file '{}': {source}", path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    /// Whether this is [`CacheError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
