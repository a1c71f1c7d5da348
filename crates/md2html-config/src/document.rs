//! Resolved document model.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A single page to build, fully resolved.
///
/// Paths are used as given (relative paths are relative to the working
/// directory). Documents are read-only once resolution is complete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Source text file.
    pub input: PathBuf,
    /// Generated HTML file.
    pub output: PathBuf,
    /// Page title, empty when not configured.
    pub title: String,
    /// Stable code other pages use to link to this one.
    pub code: Option<String>,
    /// Page template; the built-in template is used when `None`.
    pub template: Option<PathBuf>,
    /// Stylesheets referenced with `<link>`.
    pub link_css: Vec<String>,
    /// Stylesheets inlined into the page.
    pub include_css: Vec<PathBuf>,
    /// Disable the built-in stylesheet when no other CSS is configured.
    pub no_css: bool,
    /// Rebuild even when the output is newer than the input.
    pub force: bool,
    /// Report progress for this document.
    pub verbose: bool,
    /// Print the output path when the document is generated.
    pub report: bool,
    /// Names of the page flows this document belongs to.
    pub page_flows: Vec<String>,
}

impl Document {
    /// Create a document with default settings.
    #[must_use]
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            ..Self::default()
        }
    }

    /// Output path with `/` separators, as used in page links.
    pub fn output_location(&self) -> String {
        to_location(&self.output)
    }

    /// Input path with `/` separators, as used in messages.
    pub fn input_location(&self) -> String {
        to_location(&self.input)
    }

    /// Whether the output exists with a modification time strictly after
    /// the input's.
    ///
    /// Unreadable timestamps count as not newer.
    pub fn output_is_newer(&self) -> bool {
        match (modified(&self.output), modified(&self.input)) {
            (Some(output), Some(input)) => output > input,
            _ => false,
        }
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

fn to_location(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
