//! `relative-paths`: directory paths made relative to each page.

use std::collections::BTreeMap;

use md2html_config::Document;
use md2html_metadata::{MetadataBlock, MetadataError, MetadataOutput, VisitedMarkers};
use md2html_render::{Variables, relativize_resource_path};
use serde::Deserialize;
use serde_json::Value;

use crate::config::{parse_data, unique_markers};
use crate::plugin::{HandlerInfo, PageContext};
use crate::state::PluginState;
use crate::{Plugin, PluginError};

pub(crate) const NAME: &str = "relative-paths";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MarkedPaths {
    markers: Vec<String>,
    #[serde(default)]
    paths: BTreeMap<String, String>,
}

/// Named directory paths exposed relative to the page being rendered.
///
/// Configured either as a plain `{name: path}` object or as
/// `{"markers": [...], "paths": {...}}`; in the second form the markers
/// also substitute a path inline: `<!--path images-->`.
#[derive(Debug, Default)]
pub struct RelativePathsPlugin {
    state: PluginState,
    paths: BTreeMap<String, String>,
    markers: Vec<String>,
}

impl RelativePathsPlugin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plugin for RelativePathsPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn accept_data(&mut self, data: &Value) -> Result<(), PluginError> {
        self.state.configure(NAME)?;
        let (markers, paths) = if data.get("markers").is_some_and(Value::is_array) {
            let marked: MarkedPaths = parse_data(NAME, data)?;
            (marked.markers, marked.paths)
        } else {
            (Vec::new(), parse_data(NAME, data)?)
        };

        for (name, path) in &paths {
            if !path.is_empty() && !path.ends_with('/') {
                return Err(PluginError::config(
                    NAME,
                    format!("path '{name}' must be empty or end with '/': '{path}'"),
                ));
            }
        }

        self.markers = unique_markers(NAME, markers.iter().map(String::as_str))?;
        self.paths = paths;
        Ok(())
    }

    fn initialize(&mut self, _data: Option<&Value>) -> Result<(), PluginError> {
        self.state.initialize(NAME)
    }

    fn is_blank(&self) -> bool {
        self.paths.is_empty()
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
        let Some(path) = self.paths.get(block.metadata.trim()) else {
            return Ok(MetadataOutput::text(block.metadata_block));
        };
        let page = ctx.document.output_location();
        relativize_resource_path(path, &page)
            .map(MetadataOutput::Text)
            .map_err(|e| {
                MetadataError::content(format!(
                    "Plugin '{NAME}': cannot relativize '{path}' against '{page}': {e}"
                ))
            })
    }

    fn variables(&self, document: &Document) -> Result<Variables, PluginError> {
        let page = document.output_location();
        let mut variables = Variables::new();
        for (name, path) in &self.paths {
            let relative = relativize_resource_path(path, &page).map_err(|e| {
                PluginError::config(
                    NAME,
                    format!("Error recalculating relative path '{name}'='{path}' for page '{page}': {e}"),
                )
            })?;
            variables.insert(name.clone(), Value::String(relative));
        }
        Ok(variables)
    }
}
