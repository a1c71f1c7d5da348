//! `replace`: fills a positional template with the block payload.

use std::collections::HashMap;

use md2html_metadata::{MetadataBlock, MetadataError, MetadataOutput, VisitedMarkers};
use serde::Deserialize;
use serde_json::Value;

use crate::config::{parse_data, payload_values, unique_markers};
use crate::plugin::{HandlerInfo, PageContext};
use crate::replacer::Replacer;
use crate::state::PluginState;
use crate::{Plugin, PluginError};

pub(crate) const NAME: &str = "replace";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct ReplaceItem {
    markers: Vec<String>,
    replace_with: String,
    #[serde(default)]
    recursive: bool,
}

#[derive(Debug)]
struct MarkerReplacement {
    replacer: Replacer,
    recursive: bool,
}

/// Replaces `<!--MARKER value-->` or `<!--MARKER ["a", "b"]-->` with the
/// configured template, `${1}`, `${2}`, ... taking the values in order.
///
/// Leading whitespace of a single value is dropped, trailing whitespace is
/// kept.
#[derive(Debug, Default)]
pub struct ReplacePlugin {
    state: PluginState,
    /// Uppercased marker to its template, in configuration order.
    markers: Vec<String>,
    replacements: HashMap<String, MarkerReplacement>,
}

impl ReplacePlugin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plugin for ReplacePlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn accept_data(&mut self, data: &Value) -> Result<(), PluginError> {
        self.state.configure(NAME)?;
        let items: Vec<ReplaceItem> = parse_data(NAME, data)?;

        let all_markers = unique_markers(
            NAME,
            items
                .iter()
                .flat_map(|item| item.markers.iter().map(String::as_str)),
        )?;

        let mut markers = all_markers.into_iter();
        for item in items {
            let replacer = Replacer::new(&item.replace_with).map_err(|e| {
                PluginError::config(
                    NAME,
                    format!("{e} The template is: '{}'", item.replace_with),
                )
            })?;
            for marker in markers.by_ref().take(item.markers.len()) {
                self.replacements.insert(
                    marker.clone(),
                    MarkerReplacement {
                        replacer: replacer.clone(),
                        recursive: item.recursive,
                    },
                );
                self.markers.push(marker);
            }
        }
        Ok(())
    }

    fn initialize(&mut self, _data: Option<&Value>) -> Result<(), PluginError> {
        self.state.initialize(NAME)
    }

    fn is_blank(&self) -> bool {
        self.markers.is_empty()
    }

    fn page_metadata_handlers(&self) -> Vec<HandlerInfo> {
        self.markers.iter().map(HandlerInfo::anywhere).collect()
    }

    fn accept_page_metadata(
        &mut self,
        block: &MetadataBlock<'_>,
        _ctx: &PageContext<'_>,
        _visited: &VisitedMarkers,
    ) -> Result<MetadataOutput, MetadataError> {
        let marker = block.marker.to_uppercase();
        let Some(replacement) = self.replacements.get(&marker) else {
            return Ok(MetadataOutput::text(block.metadata_block));
        };

        let payload = block.metadata.trim_start();
        let values = payload_values("replace entry", payload)?;
        let text = replacement.replacer.replace(&values);

        if replacement.recursive {
            Ok(MetadataOutput::recurse(text, format!("{NAME}:{marker}:{payload}")))
        } else {
            Ok(MetadataOutput::text(text))
        }
    }
}
