//! File-based content cache.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::{CacheError, ContentCache};

/// [`ContentCache`] that reads files from disk on first access.
///
/// Keys are the paths as given; `a/b.md` and `./a/b.md` are cached
/// separately.
#[derive(Debug, Default)]
pub struct FileContentCache {
    entries: RefCell<HashMap<PathBuf, Rc<str>>>,
}

impl FileContentCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached files.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether nothing has been read yet.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl ContentCache for FileContentCache {
    fn read(&self, path: &Path) -> Result<Rc<str>, CacheError> {
        if let Some(content) = self.entries.borrow().get(path) {
            return Ok(Rc::clone(content));
        }

        let content: Rc<str> = match std::fs::read_to_string(path) {
            Ok(content) => content.into(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CacheError::NotFound(path.to_path_buf()));
            }
            Err(source) => {
                return Err(CacheError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        tracing::debug!(path = %path.display(), bytes = content.len(), "cached file content");
        self.entries
            .borrow_mut()
            .insert(path.to_path_buf(), Rc::clone(&content));
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_read_caches_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("page.md");
        fs::write(&path, "first").unwrap();

        let cache = FileContentCache::new();
        assert_eq!(&*cache.read(&path).unwrap(), "first");

        // Later changes on disk are not observed within the run.
        fs::write(&path, "second").unwrap();
        assert_eq!(&*cache.read(&path).unwrap(), "first");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let cache = FileContentCache::new();

        let err = cache.read(&tmp.path().join("missing.md")).unwrap_err();

        assert!(err.is_not_found());
        assert!(err.to_string().contains("missing.md"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_directory_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let cache = FileContentCache::new();

        let err = cache.read(tmp.path()).unwrap_err();

        assert!(!err.is_not_found());
    }

    #[test]
    fn test_missing_file_can_appear_later() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("late.md");
        let cache = FileContentCache::new();

        assert!(cache.read(&path).is_err());
        fs::write(&path, "now").unwrap();
        assert_eq!(&*cache.read(&path).unwrap(), "now");
    }
}
