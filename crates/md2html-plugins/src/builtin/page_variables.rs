//! `page-variables`: template variables declared inside the page.

use md2html_config::Document;
use md2html_metadata::{MetadataBlock, MetadataError, MetadataOutput, VisitedMarkers};
use md2html_render::Variables;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::{parse_data, parse_payload};
use crate::plugin::{HandlerInfo, PageContext};
use crate::state::PluginState;
use crate::{Plugin, PluginError};

pub(crate) const NAME: &str = "page-variables";

const DEFAULT_MARKER: &str = "VARIABLES";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct MarkerOptions {
    #[serde(default)]
    only_at_page_start: Option<bool>,
}

/// Collects `<!--VARIABLES {"title": "..."}-->` objects into the page's
/// template variables.
///
/// Each marker is start-only unless configured with
/// `"only-at-page-start": false`. The block itself renders as nothing.
#[derive(Debug, Default)]
pub struct PageVariablesPlugin {
    state: PluginState,
    handlers: Vec<HandlerInfo>,
    page_variables: Variables,
}

impl PageVariablesPlugin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plugin for PageVariablesPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn accept_data(&mut self, data: &Value) -> Result<(), PluginError> {
        self.state.configure(NAME)?;
        let markers: Map<String, Value> = if data.is_null() {
            Map::new()
        } else {
            parse_data(NAME, data)?
        };

        let mut handlers: Vec<HandlerInfo> = Vec::new();
        for (marker, options) in &markers {
            let marker = marker.to_uppercase();
            if handlers.iter().any(|h| h.marker == marker) {
                return Err(PluginError::config(
                    NAME,
                    format!("Marker duplication (case-insensitively): {marker}"),
                ));
            }
            let options: MarkerOptions = if options.is_null() {
                MarkerOptions::default()
            } else {
                parse_data(NAME, options)?
            };
            handlers.push(HandlerInfo::new(
                marker,
                options.only_at_page_start.unwrap_or(true),
            ));
        }
        if handlers.is_empty() {
            handlers.push(HandlerInfo::new(DEFAULT_MARKER, true));
        }

        self.handlers = handlers;
        Ok(())
    }

    fn initialize(&mut self, _data: Option<&Value>) -> Result<(), PluginError> {
        self.state.initialize(NAME)
    }

    fn is_blank(&self) -> bool {
        self.handlers.is_empty()
    }

    fn page_metadata_handlers(&self) -> Vec<HandlerInfo> {
        self.handlers.clone()
    }

    fn accept_page_metadata(
        &mut self,
        block: &MetadataBlock<'_>,
        _ctx: &PageContext<'_>,
        _visited: &VisitedMarkers,
    ) -> Result<MetadataOutput, MetadataError> {
        let variables: Map<String, Value> = parse_payload("page metadata", block.metadata)?;
        self.page_variables.extend(variables);
        Ok(MetadataOutput::text(""))
    }

    fn variables(&self, _document: &Document) -> Result<Variables, PluginError> {
        Ok(self.page_variables.clone())
    }

    fn new_page(&mut self, _document: &Document) -> Result<(), PluginError> {
        self.page_variables.clear();
        Ok(())
    }
}
