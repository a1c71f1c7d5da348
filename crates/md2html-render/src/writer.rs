//! Page output.

use std::fs;
use std::path::Path;

use chrono::{Local, NaiveDateTime};
use md2html_cache::ContentCache;
use md2html_config::Document;
use serde_json::Value;

use crate::{
    DEFAULT_TEMPLATE, DEFAULT_TEMPLATE_NAME, RenderError, TemplateRenderer, Variables,
    document_styles,
};

/// Executable name exposed to templates as `exec_name`.
pub const EXEC_NAME: &str = "md2html";

/// Executable version exposed to templates as `exec_version`.
pub const EXEC_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Renders documents through their templates and writes the results.
pub struct PageWriter<'a> {
    renderer: TemplateRenderer,
    cache: &'a dyn ContentCache,
    generated_at: Option<NaiveDateTime>,
}

impl<'a> PageWriter<'a> {
    /// Create a writer reading templates and stylesheets through `cache`.
    #[must_use]
    pub fn new(cache: &'a dyn ContentCache) -> Self {
        Self {
            renderer: TemplateRenderer::new(),
            cache,
            generated_at: None,
        }
    }

    /// Use a fixed generation time instead of the current local time.
    #[must_use]
    pub fn with_generation_time(mut self, generated_at: NaiveDateTime) -> Self {
        self.generated_at = Some(generated_at);
        self
    }

    /// Assemble the template variables for a page.
    ///
    /// `title` comes first so plugins can override it. `content`, `styles`
    /// and the generator variables are set last and always win.
    pub fn page_variables(
        &self,
        doc: &Document,
        content: &str,
        plugin_variables: Variables,
    ) -> Result<Variables, RenderError> {
        let mut variables = Variables::new();
        variables.insert("title".to_owned(), Value::from(doc.title.as_str()));
        variables.extend(plugin_variables);

        let generated_at = self
            .generated_at
            .unwrap_or_else(|| Local::now().naive_local());
        variables.insert(
            "styles".to_owned(),
            Value::from(document_styles(doc, self.cache)?),
        );
        variables.insert("content".to_owned(), Value::from(content));
        variables.insert("exec_name".to_owned(), Value::from(EXEC_NAME));
        variables.insert("exec_version".to_owned(), Value::from(EXEC_VERSION));
        variables.insert(
            "generation_date".to_owned(),
            Value::from(generated_at.format("%Y-%m-%d").to_string()),
        );
        variables.insert(
            "generation_time".to_owned(),
            Value::from(generated_at.format("%H:%M:%S").to_string()),
        );
        Ok(variables)
    }

    /// Render `doc` with the given HTML `content` and write its output file.
    ///
    /// Parent directories of the output are created as needed.
    pub fn write(
        &self,
        doc: &Document,
        content: &str,
        plugin_variables: Variables,
    ) -> Result<(), RenderError> {
        let variables = self.page_variables(doc, content, plugin_variables)?;
        let html = match &doc.template {
            Some(path) => {
                let source = self.cache.read(path)?;
                self.renderer
                    .render(&path.to_string_lossy(), &source, &variables)?
            }
            None => self
                .renderer
                .render(DEFAULT_TEMPLATE_NAME, DEFAULT_TEMPLATE, &variables)?,
        };

        write_file(&doc.output, &html)?;
        tracing::debug!(output = %doc.output.display(), "page written");
        Ok(())
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), RenderError> {
    let write_error = |source| RenderError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(path, content).map_err(write_error)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use md2html_cache::MemoryContentCache;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn fixed_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 30)
            .unwrap()
    }

    #[test]
    fn test_page_variables() {
        let cache = MemoryContentCache::new();
        let writer = PageWriter::new(&cache).with_generation_time(fixed_time());
        let mut doc = Document::new("a.md", "a.html");
        doc.title = "Doc title".to_owned();
        doc.no_css = true;

        let mut plugin_variables = Variables::new();
        plugin_variables.insert("author".to_owned(), json!("Docs team"));
        plugin_variables.insert("content".to_owned(), json!("ignored"));

        let variables = writer
            .page_variables(&doc, "<p>Body</p>", plugin_variables)
            .unwrap();

        assert_eq!(variables["title"], "Doc title");
        assert_eq!(variables["author"], "Docs team");
        assert_eq!(variables["content"], "<p>Body</p>");
        assert_eq!(variables["styles"], "");
        assert_eq!(variables["exec_name"], EXEC_NAME);
        assert_eq!(variables["generation_date"], "2024-03-09");
        assert_eq!(variables["generation_time"], "07:05:30");
    }

    #[test]
    fn test_plugins_can_override_title() {
        let cache = MemoryContentCache::new();
        let writer = PageWriter::new(&cache);
        let mut plugin_variables = Variables::new();
        plugin_variables.insert("title".to_owned(), json!("From page"));

        let variables = writer
            .page_variables(&Document::new("a.md", "a.html"), "", plugin_variables)
            .unwrap();

        assert_eq!(variables["title"], "From page");
    }

    #[test]
    fn test_write_with_custom_template() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("site/nested/page.html");
        let cache = MemoryContentCache::new()
            .with_file("page.tpl", "<h1>{{ title }}</h1>{{ content }}<i>{{ generation_date }}</i>");
        let writer = PageWriter::new(&cache).with_generation_time(fixed_time());
        let mut doc = Document::new("page.md", &output);
        doc.title = "A & B".to_owned();
        doc.template = Some("page.tpl".into());

        writer.write(&doc, "<p>x</p>", Variables::new()).unwrap();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "<h1>A &amp; B</h1><p>x</p><i>2024-03-09</i>"
        );
    }

    #[test]
    fn test_write_with_default_template() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("page.html");
        let cache = MemoryContentCache::new();
        let writer = PageWriter::new(&cache);
        let doc = Document::new("page.md", &output);

        writer.write(&doc, "<p>Body</p>", Variables::new()).unwrap();

        let html = fs::read_to_string(&output).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<p>Body</p>"));
        assert!(html.contains(crate::DEFAULT_CSS));
    }

    #[test]
    fn test_missing_template() {
        let cache = MemoryContentCache::new();
        let writer = PageWriter::new(&cache);
        let mut doc = Document::new("a.md", "a.html");
        doc.template = Some("missing.tpl".into());

        let err = writer.write(&doc, "", Variables::new()).unwrap_err();

        assert!(matches!(err, RenderError::Cache(_)));
    }
}
