//! `page-links`: links to other documents by their code.

use std::collections::HashMap;

use md2html_config::Document;
use md2html_metadata::{MetadataBlock, MetadataError, MetadataOutput, VisitedMarkers};
use md2html_render::relativize_resource;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{parse_data, unique_markers};
use crate::plugin::{HandlerInfo, PageContext};
use crate::state::PluginState;
use crate::{Plugin, PluginError};

pub(crate) const NAME: &str = "page-links";

const DEFAULT_MARKER: &str = "page";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PageLinksData {
    #[serde(default)]
    markers: Option<Vec<String>>,
}

/// Replaces `<!--page code-->` with the link from the current page to the
/// document whose `code` is `code`.
#[derive(Debug, Default)]
pub struct PageLinksPlugin {
    state: PluginState,
    markers: Vec<String>,
    /// Document code to output location.
    pages: HashMap<String, String>,
}

impl PageLinksPlugin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plugin for PageLinksPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn accept_data(&mut self, data: &Value) -> Result<(), PluginError> {
        self.state.configure(NAME)?;
        let data: PageLinksData = if data.is_null() {
            PageLinksData::default()
        } else {
            parse_data(NAME, data)?
        };
        let markers = data
            .markers
            .filter(|markers| !markers.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_MARKER.to_owned()]);
        self.markers = unique_markers(NAME, markers.iter().map(String::as_str))?;
        Ok(())
    }

    fn initialize(&mut self, _data: Option<&Value>) -> Result<(), PluginError> {
        self.state.initialize(NAME)
    }

    fn is_blank(&self) -> bool {
        self.markers.is_empty()
    }

    fn accept_document_list(&mut self, documents: &[Document]) -> Result<(), PluginError> {
        self.pages = documents
            .iter()
            .filter_map(|doc| {
                doc.code
                    .as_ref()
                    .map(|code| (code.clone(), doc.output_location()))
            })
            .collect();
        Ok(())
    }

    fn page_metadata_handlers(&self) -> Vec<HandlerInfo> {
        self.markers.iter().map(HandlerInfo::anywhere).collect()
    }

    fn accept_page_metadata(
        &mut self,
        block: &MetadataBlock<'_>,
        ctx: &PageContext<'_>,
        _visited: &VisitedMarkers,
    ) -> Result<MetadataOutput, MetadataError> {
        let code = block.metadata.trim();
        let Some(target) = self.pages.get(code) else {
            tracing::warn!(code, page = %ctx.document.output_location(), "Unknown page code");
            return Ok(MetadataOutput::text(block.metadata_block));
        };
        relativize_resource(target, &ctx.document.output_location())
            .map(MetadataOutput::Text)
            .map_err(|e| MetadataError::content(format!("Plugin '{NAME}': {e}")))
    }
}
