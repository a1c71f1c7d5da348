//! The plugin capability protocol.

use md2html_cache::ContentCache;
use md2html_config::{Document, DocumentResolver, Options};
use md2html_metadata::{MetadataBlock, MetadataError, MetadataOutput, VisitedMarkers};
use md2html_render::Variables;
use serde_json::{Map, Value};

use crate::PluginError;

/// Data addressed to plugins by name, exchanged during pre-initialization.
pub type PluginDataMap = Map<String, Value>;

/// A marker a plugin handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerInfo {
    pub marker: String,
    /// Only fire when the block opens the page.
    pub start_only: bool,
}

impl HandlerInfo {
    pub fn new(marker: impl Into<String>, start_only: bool) -> Self {
        Self {
            marker: marker.into(),
            start_only,
        }
    }

    /// A handler that fires wherever the block appears.
    pub fn anywhere(marker: impl Into<String>) -> Self {
        Self::new(marker, false)
    }
}

/// Services available before the run starts.
#[derive(Debug, Clone, Copy)]
pub struct PreInitContext<'a> {
    /// Resolves documents with the rules used for ordinary documents.
    pub resolver: &'a DocumentResolver,
    pub options: &'a Options,
}

/// The page being substituted and the services its handlers may use.
#[derive(Clone, Copy)]
pub struct PageContext<'a> {
    pub document: &'a Document,
    pub cache: &'a dyn ContentCache,
}

/// What happened to a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Generated,
    UpToDate,
}

/// A page the run generated or skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub document: Document,
    pub status: PageStatus,
}

/// Services available to [`Plugin::finalize`].
pub struct FinalizeContext<'a> {
    /// Every plugin of the run except the one being finalized.
    pub others: OtherPlugins<'a>,
    pub cache: &'a dyn ContentCache,
    pub options: &'a Options,
    /// Pages produced during finalization.
    pub pages: &'a mut Vec<PageRecord>,
}

/// The plugins around the one being finalized, in registration order.
pub struct OtherPlugins<'a> {
    before: &'a mut [Box<dyn Plugin>],
    after: &'a mut [Box<dyn Plugin>],
}

impl<'a> OtherPlugins<'a> {
    pub(crate) fn new(before: &'a mut [Box<dyn Plugin>], after: &'a mut [Box<dyn Plugin>]) -> Self {
        Self { before, after }
    }

    /// Start a new page in every other plugin.
    pub fn new_page(&mut self, document: &Document) -> Result<(), PluginError> {
        for plugin in self.before.iter_mut().chain(self.after.iter_mut()) {
            plugin.new_page(document)?;
        }
        Ok(())
    }

    /// Variables of every other plugin, later plugins overriding earlier ones.
    pub fn variables(&self, document: &Document) -> Result<Variables, PluginError> {
        let mut variables = Variables::new();
        for plugin in self.before.iter().chain(self.after.iter()) {
            variables.extend(plugin.variables(document)?);
        }
        Ok(variables)
    }

    pub fn len(&self) -> usize {
        self.before.len() + self.after.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A plugin: a bundle of optional capabilities.
///
/// Every method except [`name`](Plugin::name) has a no-op default, so a
/// plugin implements only what it contributes. Hooks run in this order:
/// `accept_data`, `pre_initialize`, `initialize`, `is_blank`,
/// `page_metadata_handlers`, `accept_document_list`, then per page
/// `new_page`, `accept_page_metadata` and `variables`, and finally
/// `finalize`.
pub trait Plugin {
    /// Name the plugin is configured under.
    fn name(&self) -> &str;

    /// Accept the plugin's configuration.
    fn accept_data(&mut self, _data: &Value) -> Result<(), PluginError> {
        Ok(())
    }

    /// Prepare before initialization; returns data for other plugins.
    fn pre_initialize(&mut self, _ctx: &PreInitContext<'_>) -> Result<PluginDataMap, PluginError> {
        Ok(PluginDataMap::new())
    }

    /// Finish setup with the data other parties addressed to this plugin.
    fn initialize(&mut self, _data: Option<&Value>) -> Result<(), PluginError> {
        Ok(())
    }

    /// Whether the plugin contributes nothing and can be dropped.
    fn is_blank(&self) -> bool {
        false
    }

    /// Receive every document of the run.
    fn accept_document_list(&mut self, _documents: &[Document]) -> Result<(), PluginError> {
        Ok(())
    }

    /// Markers this plugin handles.
    fn page_metadata_handlers(&self) -> Vec<HandlerInfo> {
        Vec::new()
    }

    /// Handle a metadata block.
    fn accept_page_metadata(
        &mut self,
        block: &MetadataBlock<'_>,
        _ctx: &PageContext<'_>,
        _visited: &VisitedMarkers,
    ) -> Result<MetadataOutput, MetadataError> {
        Ok(MetadataOutput::text(block.metadata_block))
    }

    /// Template variables for `document`.
    fn variables(&self, _document: &Document) -> Result<Variables, PluginError> {
        Ok(Variables::new())
    }

    /// Reset per-page state before `document` is processed.
    fn new_page(&mut self, _document: &Document) -> Result<(), PluginError> {
        Ok(())
    }

    /// Run once after every document has been processed.
    fn finalize(&mut self, _ctx: &mut FinalizeContext<'_>) -> Result<(), PluginError> {
        Ok(())
    }
}
