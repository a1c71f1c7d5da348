//! Argument file model and parsing.
//!
//! An argument file is JSON (lines whose first non-blank character is `#`
//! are comments) or TOML when the file name ends in `.toml`:
//!
//! ```json
//! {
//!   # Shared settings for every document.
//!   "default": {"output-root": "site", "template": "templates/page.html"},
//!   "documents": [
//!     {"input": "index.md", "title": "Home", "code": "home"},
//!     {"input-root": "docs", "input-glob": "**/*.md", "sort-by-file-path": true}
//!   ],
//!   "plugins": {"page-variables": {}, "relative-paths": {"resources": "assets/"}}
//! }
//! ```

use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::ConfigError;

/// Argument file as parsed, before merging and resolution.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) struct ArgFileRaw {
    pub options: OptionsRaw,
    pub default: DocumentRaw,
    pub documents: Option<Vec<DocumentRaw>>,
    pub plugins: Map<String, Value>,
}

/// The `options` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) struct OptionsRaw {
    pub verbose: Option<bool>,
}

/// A `documents` item or the `default` section.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) struct DocumentRaw {
    pub input: Option<String>,
    pub input_glob: Option<String>,
    pub input_root: Option<String>,
    pub output: Option<String>,
    pub output_root: Option<String>,
    pub title: Option<String>,
    pub code: Option<String>,
    pub template: Option<String>,
    pub link_css: Option<Vec<String>>,
    pub add_link_css: Option<Vec<String>>,
    pub include_css: Option<Vec<String>>,
    pub add_include_css: Option<Vec<String>>,
    pub no_css: Option<bool>,
    pub force: Option<bool>,
    pub verbose: Option<bool>,
    pub report: Option<bool>,
    pub page_flows: Option<Vec<String>>,
    pub add_page_flows: Option<Vec<String>>,
    pub sort_by_file_path: Option<bool>,
}

impl DocumentRaw {
    /// Short description used in validation messages.
    pub fn describe(&self) -> String {
        match (&self.input, &self.input_glob) {
            (Some(input), _) => format!("'documents' item with input '{input}'"),
            (None, Some(glob)) => format!("'documents' item with input-glob '{glob}'"),
            (None, None) => "'documents' item".to_owned(),
        }
    }
}

impl ArgFileRaw {
    /// Load an argument file, choosing the format by extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Ok(toml::from_str(&content)?)
        } else {
            Self::parse_json(&content)
        }
    }

    /// Parse JSON argument file content with `#` comment lines.
    pub fn parse_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(&blank_comment_lines(content, '#'))?)
    }
}

/// Replace the visible characters of comment lines with spaces.
///
/// Line and column numbers in parse errors stay valid for the original text.
fn blank_comment_lines(content: &str, comment_char: char) -> String {
    content
        .split_inclusive('\n')
        .map(|line| {
            if line.trim_start().starts_with(comment_char) {
                line.chars()
                    .map(|c| if c.is_whitespace() { c } else { ' ' })
                    .collect()
            } else {
                line.to_owned()
            }
        })
        .collect()
}
