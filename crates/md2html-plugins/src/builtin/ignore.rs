//! `ignore`: turns a marked block into a plain HTML comment.

use md2html_metadata::{END_TOKEN, MetadataBlock, MetadataError, MetadataOutput, START_TOKEN, VisitedMarkers};
use serde::Deserialize;
use serde_json::Value;

use crate::config::{parse_data, unique_markers};
use crate::plugin::{HandlerInfo, PageContext};
use crate::state::PluginState;
use crate::{Plugin, PluginError};

pub(crate) const NAME: &str = "ignore";

const DEFAULT_MARKER: &str = "ignore";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct IgnoreData {
    #[serde(default)]
    markers: Option<Vec<String>>,
}

/// Drops the marker from its blocks so they stay in the page as comments.
///
/// `<!--ignore <b>-->` becomes `<!--<b>-->`. Useful to show block syntax in
/// documentation without it being processed.
#[derive(Debug, Default)]
pub struct IgnorePlugin {
    state: PluginState,
    markers: Vec<String>,
}

impl IgnorePlugin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plugin for IgnorePlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn accept_data(&mut self, data: &Value) -> Result<(), PluginError> {
        self.state.configure(NAME)?;
        let data: IgnoreData = if data.is_null() {
            IgnoreData::default()
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

    fn page_metadata_handlers(&self) -> Vec<HandlerInfo> {
        self.markers.iter().map(HandlerInfo::anywhere).collect()
    }

    fn accept_page_metadata(
        &mut self,
        block: &MetadataBlock<'_>,
        _ctx: &PageContext<'_>,
        _visited: &VisitedMarkers,
    ) -> Result<MetadataOutput, MetadataError> {
        Ok(MetadataOutput::text(format!(
            "{START_TOKEN}{}{END_TOKEN}",
            block.metadata.trim_start()
        )))
    }
}

#[cfg(test)]
mod tests {
    use md2html_cache::MemoryContentCache;
    use md2html_config::Document;
    use md2html_metadata::{SubstitutionEngine, scan};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::PluginSet;

    fn process(data: Value, text: &str) -> String {
        let mut plugin = IgnorePlugin::new();
        plugin.accept_data(&data).unwrap();
        plugin.initialize(None).unwrap();
        let mut set = PluginSet::new();
        set.push(Box::new(plugin));
        let registry = set.build_registry().unwrap();
        let document = Document::new("page.md", "page.html");
        let cache = MemoryContentCache::new();
        let ctx = PageContext {
            document: &document,
            cache: &cache,
        };
        SubstitutionEngine::new(&registry)
            .apply(text, &mut set, &ctx, &mut VisitedMarkers::new())
            .unwrap()
    }

    #[test]
    fn test_default_marker() {
        assert_eq!(
            process(json!({}), "a <!--ignore <b>--> c"),
            "a <!--<b>--> c"
        );
    }

    #[test]
    fn test_custom_markers_are_case_insensitive() {
        let output = process(
            json!({"markers": ["skip", "hide"]}),
            "<!--SKIP one--> <!--hide two--> <!--ignore three-->",
        );

        assert_eq!(output, "<!--one--> <!--two--> <!--ignore three-->");
    }

    #[test]
    fn test_empty_markers_fall_back_to_default() {
        assert_eq!(process(json!({"markers": []}), "<!--ignore x-->"), "<!--x-->");
    }

    #[test]
    fn test_nested_block_content_is_kept() {
        let text = "<!--ignore <!--VARIABLES {}-->-->";
        assert_eq!(scan(text).count(), 1);

        assert_eq!(process(json!({}), text), "<!--<!--VARIABLES {}-->-->");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut plugin = IgnorePlugin::new();

        let err = plugin.accept_data(&json!({"marker": ["x"]})).unwrap_err();

        assert!(matches!(err, PluginError::Config { .. }));
    }

    #[test]
    fn test_configure_only_once() {
        let mut plugin = IgnorePlugin::new();
        plugin.accept_data(&json!({})).unwrap();

        assert!(matches!(
            plugin.accept_data(&json!({})).unwrap_err(),
            PluginError::Contract(_)
        ));
    }
}
