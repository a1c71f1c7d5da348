//! Markdown to HTML conversion.

use pulldown_cmark::{Options, Parser, html};

/// Converts page text to an HTML fragment.
pub trait MarkdownConverter {
    /// Convert `text` to HTML.
    fn convert(&self, text: &str) -> String;
}

/// CommonMark converter backed by pulldown-cmark.
///
/// Raw HTML in the source, including metadata block output, passes through
/// unchanged.
#[derive(Debug, Clone, Copy)]
pub struct CommonMarkConverter {
    gfm: bool,
}

impl Default for CommonMarkConverter {
    fn default() -> Self {
        Self { gfm: true }
    }
}

impl CommonMarkConverter {
    /// Create a converter with GitHub Flavored Markdown enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// GFM is enabled by default. When enabled, the parser supports:
    /// - Tables
    /// - Strikethrough (`~~text~~`)
    /// - Task lists (`- [ ] item`)
    /// - Footnotes
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Get parser options based on GFM configuration.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let options = Options::ENABLE_HEADING_ATTRIBUTES;
        if self.gfm {
            options
                | Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_GFM
        } else {
            options
        }
    }
}

impl MarkdownConverter for CommonMarkConverter {
    fn convert(&self, text: &str) -> String {
        let parser = Parser::new_ext(text, self.parser_options());
        let mut output = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut output, parser);
        output
    }
}
