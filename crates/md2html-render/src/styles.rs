//! Stylesheet markup for a page.

use md2html_cache::ContentCache;
use md2html_config::Document;

use crate::{DEFAULT_CSS, RenderError, relativize_resource};

/// Build the `styles` template variable for `doc`.
///
/// Linked stylesheets become `<link>` elements with hrefs relative to the
/// page; included stylesheets are inlined in `<style>` elements. With no
/// CSS configured and `no_css` unset the built-in stylesheet is inlined.
pub fn document_styles(doc: &Document, cache: &dyn ContentCache) -> Result<String, RenderError> {
    let page = doc.output_location();
    let mut styles = Vec::with_capacity(doc.link_css.len() + doc.include_css.len());

    for link in &doc.link_css {
        let href = if is_external(link) {
            link.clone()
        } else {
            relativize_resource(link, &page)?
        };
        styles.push(format!(
            "<link rel=\"stylesheet\" type=\"text/css\" href=\"{href}\">"
        ));
    }

    for path in &doc.include_css {
        let css = cache.read(path)?;
        styles.push(format!("<style>\n{css}\n</style>"));
    }

    if styles.is_empty() && !doc.no_css {
        styles.push(format!("<style>\n{DEFAULT_CSS}\n</style>"));
    }

    Ok(styles.join("\n"))
}

/// URLs and absolute paths are linked as written.
fn is_external(link: &str) -> bool {
    link.starts_with('/') || link.contains("://")
}
