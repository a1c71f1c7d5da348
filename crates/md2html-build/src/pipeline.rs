//! Per-document processing.

use md2html_cache::ContentCache;
use md2html_config::{Document, Options};
use md2html_metadata::{HandlerRegistry, SubstitutionEngine, VisitedMarkers};
use md2html_plugins::{PageContext, PageRecord, PageStatus, PluginSet};
use md2html_render::{MarkdownConverter, PageWriter};

use crate::error::{BuildError, PageError};
use crate::gate::IncrementalBuildGate;

/// Collaborators shared by every document of a run.
pub struct Services<'a> {
    pub cache: &'a dyn ContentCache,
    pub converter: &'a dyn MarkdownConverter,
    pub writer: PageWriter<'a>,
    pub gate: IncrementalBuildGate,
}

impl<'a> Services<'a> {
    /// Services reading through `cache` and writing with a default [`PageWriter`].
    pub fn new(cache: &'a dyn ContentCache, converter: &'a dyn MarkdownConverter) -> Self {
        Self {
            cache,
            converter,
            writer: PageWriter::new(cache),
            gate: IncrementalBuildGate::new(),
        }
    }

    /// Replace the page writer.
    #[must_use]
    pub fn with_writer(mut self, writer: PageWriter<'a>) -> Self {
        self.writer = writer;
        self
    }
}

/// Build one document unless it is up to date.
///
/// Skipped documents are not read and no plugin sees them. Failures are
/// reported against the document's input file.
pub fn process(
    document: &Document,
    plugins: &mut PluginSet,
    registry: &HandlerRegistry,
    services: &Services<'_>,
) -> Result<PageStatus, BuildError> {
    if services.gate.is_up_to_date(document) {
        tracing::debug!(output = %document.output.display(), "Output is up to date, skipping");
        return Ok(PageStatus::UpToDate);
    }

    render_page(document, plugins, registry, services).map_err(|source| {
        BuildError::Document {
            input: document.input.clone(),
            source,
        }
    })?;

    tracing::info!(output = %document.output.display(), "Output file generated");
    Ok(PageStatus::Generated)
}

fn render_page(
    document: &Document,
    plugins: &mut PluginSet,
    registry: &HandlerRegistry,
    services: &Services<'_>,
) -> Result<(), PageError> {
    plugins.new_page(document)?;
    let text = services.cache.read(&document.input)?;

    let ctx = PageContext {
        document,
        cache: services.cache,
    };
    let substituted = SubstitutionEngine::new(registry).apply(
        &text,
        plugins,
        &ctx,
        &mut VisitedMarkers::new(),
    )?;

    let html = services.converter.convert(&substituted);
    let variables = plugins.variables(document)?;
    services.writer.write(document, &html, variables)?;
    Ok(())
}

/// Finalize every plugin once, in registration order.
///
/// Pages the plugins generate are appended to `pages`.
pub fn finalize_all(
    plugins: &mut PluginSet,
    options: &Options,
    services: &Services<'_>,
    pages: &mut Vec<PageRecord>,
) -> Result<(), BuildError> {
    plugins.finalize_all(services.cache, options, pages)?;
    Ok(())
}
