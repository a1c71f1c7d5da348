//! Incremental build gate.

use md2html_config::Document;

/// Decides whether a document has to be regenerated.
///
/// A document is up to date when it is not forced and its output exists
/// with a modification time strictly after the input's. Timestamps are the
/// only signal: an edit within the file system's time granularity goes
/// unnoticed.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncrementalBuildGate;

impl IncrementalBuildGate {
    pub fn new() -> Self {
        Self
    }

    /// Whether `document` can be skipped.
    ///
    /// Unreadable timestamps count as stale so the pipeline reports the
    /// underlying problem when it reads the input.
    pub fn is_up_to_date(&self, document: &Document) -> bool {
        !document.force && document.output_is_newer()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::fs::{self, File};
    use std::path::{Path, PathBuf};
    use std::time::{Duration, SystemTime};

    use super::*;

    /// Write `path` and set its modification time `age_secs` before `now`.
    pub(crate) fn write_aged(path: &Path, content: &str, now: SystemTime, age_secs: u64) {
        fs::write(path, content).unwrap();
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(now - Duration::from_secs(age_secs))
            .unwrap();
    }

    fn document(dir: &Path) -> Document {
        Document::new(dir.join("page.md"), dir.join("page.html"))
    }

    #[test]
    fn test_newer_output_is_up_to_date() {
        let dir = tempfile::tempdir().unwrap();
        let now = SystemTime::now();
        let doc = document(dir.path());
        write_aged(&doc.input, "text", now, 3600);
        write_aged(&doc.output, "<p>text</p>", now, 60);

        assert!(IncrementalBuildGate::new().is_up_to_date(&doc));
    }

    #[test]
    fn test_force_regenerates() {
        let dir = tempfile::tempdir().unwrap();
        let now = SystemTime::now();
        let doc = Document {
            force: true,
            ..document(dir.path())
        };
        write_aged(&doc.input, "text", now, 3600);
        write_aged(&doc.output, "<p>text</p>", now, 60);

        assert!(!IncrementalBuildGate::new().is_up_to_date(&doc));
    }

    #[test]
    fn test_older_or_equal_output_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let now = SystemTime::now();
        let doc = document(dir.path());
        write_aged(&doc.input, "text", now, 60);
        write_aged(&doc.output, "<p>text</p>", now, 3600);
        assert!(!IncrementalBuildGate::new().is_up_to_date(&doc));

        write_aged(&doc.input, "text", now, 600);
        write_aged(&doc.output, "<p>text</p>", now, 600);
        assert!(!IncrementalBuildGate::new().is_up_to_date(&doc));
    }

    #[test]
    fn test_missing_files_are_stale() {
        let dir = tempfile::tempdir().unwrap();
        let doc = document(dir.path());
        assert!(!IncrementalBuildGate::new().is_up_to_date(&doc));

        write_aged(&doc.output, "<p>orphan</p>", SystemTime::now(), 0);
        let doc = Document {
            input: PathBuf::from("missing.md"),
            ..doc
        };
        assert!(!IncrementalBuildGate::new().is_up_to_date(&doc));
    }
}
