//! In-memory content cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::{CacheError, ContentCache};

/// [`ContentCache`] over a fixed set of files held in memory.
///
/// Useful for driving plugins and the pipeline without a file system.
#[derive(Debug, Default, Clone)]
pub struct MemoryContentCache {
    files: HashMap<PathBuf, Rc<str>>,
}

impl MemoryContentCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: &str) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }
}

impl ContentCache for MemoryContentCache {
    fn read(&self, path: &Path) -> Result<Rc<str>, CacheError> {
        self.files
            .get(path)
            .map(Rc::clone)
            .ok_or_else(|| CacheError::NotFound(path.to_path_buf()))
    }
}
