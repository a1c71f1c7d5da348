//! `include-file`: inlines (part of) another file.

use std::collections::HashMap;
use std::path::PathBuf;

use md2html_metadata::{MetadataBlock, MetadataError, MetadataOutput, VisitedMarkers};
use serde::Deserialize;
use serde_json::Value;

use crate::config::{parse_data, parse_payload, unique_markers};
use crate::plugin::{HandlerInfo, PageContext};
use crate::state::PluginState;
use crate::substring::{DelimiterOverrides, Delimiters, Substringer};
use crate::{Plugin, PluginError};

pub(crate) const NAME: &str = "include-file";

/// Whitespace trimming applied to included content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum Trim {
    /// Leading and trailing whitespace.
    #[default]
    All,
    /// Leading and trailing blank lines; indentation is kept.
    EmptyLines,
    #[serde(rename = "none")]
    Nothing,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct IncludeItem {
    markers: Vec<String>,
    root_dir: PathBuf,
    #[serde(default)]
    trim: Trim,
    #[serde(default)]
    recursive: bool,
    #[serde(default)]
    start_with: String,
    #[serde(default)]
    end_with: String,
    #[serde(default)]
    start_marker: String,
    #[serde(default)]
    end_marker: String,
}

/// Block payload in object form.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct IncludeRequest {
    file: String,
    trim: Option<Trim>,
    recursive: Option<bool>,
    start_with: Option<String>,
    end_with: Option<String>,
    start_marker: Option<String>,
    end_marker: Option<String>,
}

impl IncludeRequest {
    fn file(file: &str) -> Self {
        Self {
            file: file.to_owned(),
            trim: None,
            recursive: None,
            start_with: None,
            end_with: None,
            start_marker: None,
            end_marker: None,
        }
    }

    fn overrides(&self) -> DelimiterOverrides<'_> {
        DelimiterOverrides {
            start_with: self.start_with.as_deref(),
            end_with: self.end_with.as_deref(),
            start_marker: self.start_marker.as_deref(),
            end_marker: self.end_marker.as_deref(),
        }
    }
}

#[derive(Debug)]
struct MarkerSettings {
    root_dir: PathBuf,
    trim: Trim,
    recursive: bool,
    substringer: Substringer,
}

/// Replaces `<!--INCLUDE path/to/file.md-->` with the file's content.
///
/// The payload may also be an object overriding the marker's settings:
/// `<!--INCLUDE {"file": "a.rs", "start-marker": "// begin", "trim": "empty-lines"}-->`.
/// Files are read through the run's content cache. Recursive includes are
/// substituted again and guarded against cycles.
#[derive(Debug, Default)]
pub struct IncludeFilePlugin {
    state: PluginState,
    markers: Vec<String>,
    settings: HashMap<String, MarkerSettings>,
}

impl IncludeFilePlugin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plugin for IncludeFilePlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn accept_data(&mut self, data: &Value) -> Result<(), PluginError> {
        self.state.configure(NAME)?;
        let items: Vec<IncludeItem> = parse_data(NAME, data)?;

        let markers = unique_markers(
            NAME,
            items
                .iter()
                .flat_map(|item| item.markers.iter().map(String::as_str)),
        )?;

        let mut remaining = markers.iter();
        for item in items {
            let substringer = Substringer::new(Delimiters {
                start_with: item.start_with,
                end_with: item.end_with,
                start_marker: item.start_marker,
                end_marker: item.end_marker,
            })
            .map_err(|e| PluginError::config(NAME, e.to_string()))?;

            for marker in remaining.by_ref().take(item.markers.len()) {
                self.settings.insert(
                    marker.clone(),
                    MarkerSettings {
                        root_dir: item.root_dir.clone(),
                        trim: item.trim,
                        recursive: item.recursive,
                        substringer: substringer.clone(),
                    },
                );
            }
        }
        self.markers = markers;
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
        ctx: &PageContext<'_>,
        _visited: &VisitedMarkers,
    ) -> Result<MetadataOutput, MetadataError> {
        let Some(settings) = self.settings.get(&block.marker.to_uppercase()) else {
            return Ok(MetadataOutput::text(block.metadata_block));
        };

        let payload = block.metadata.trim();
        let request = if payload.starts_with('{') {
            parse_payload("inclusion", payload).map_err(|e| {
                MetadataError::content(format!(
                    "Error in inclusion: {e}, page: '{}'",
                    ctx.document.input_location()
                ))
            })?
        } else {
            IncludeRequest::file(payload)
        };

        let path = settings.root_dir.join(request.file.trim());
        let content = ctx.cache.read(&path).map_err(|e| {
            MetadataError::content(format!("Error processing page metadata block: {e}"))
        })?;

        let substringer = settings
            .substringer
            .with_overrides(&request.overrides())
            .map_err(|e| MetadataError::content(format!("Error in inclusion: {e}")))?;
        let selected = substringer.substring(&content);

        let text = match request.trim.unwrap_or(settings.trim) {
            Trim::All => selected.trim(),
            Trim::EmptyLines => strip_empty_lines(selected),
            Trim::Nothing => selected,
        };

        if request.recursive.unwrap_or(settings.recursive) {
            let token = format!("include:{}", path.to_string_lossy().replace('\\', "/"));
            Ok(MetadataOutput::recurse(text, token))
        } else {
            Ok(MetadataOutput::text(text))
        }
    }
}

/// Drop leading and trailing lines that hold only whitespace.
fn strip_empty_lines(text: &str) -> &str {
    let Some(first) = text.find(|c: char| !c.is_whitespace()) else {
        return "";
    };
    let last = text
        .rfind(|c: char| !c.is_whitespace())
        .unwrap_or(first);

    let start = text[..first].rfind('\n').map_or(0, |i| i + 1);
    let end = text[last..].find('\n').map_or(text.len(), |i| last + i);
    text[start..end].trim_end_matches('\r')
}

#[cfg(test)]
mod tests {
    use md2html_cache::MemoryContentCache;
    use md2html_config::Document;
    use md2html_metadata::{HandlerRegistry, SubstitutionEngine};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::PluginSet;

    const SAMPLE: &str = "\n  \n   Sample text 1   \n  Sample text 2\n\n";

    fn plugin_set(data: Value) -> (PluginSet, HandlerRegistry) {
        let mut plugin = IncludeFilePlugin::new();
        plugin.accept_data(&data).unwrap();
        plugin.initialize(None).unwrap();
        let mut set = PluginSet::new();
        set.push(Box::new(plugin));
        let registry = set.build_registry().unwrap();
        (set, registry)
    }

    fn cache() -> MemoryContentCache {
        MemoryContentCache::new()
            .with_file("snippets/sample.txt", SAMPLE)
            .with_file("snippets/code.rs", "fn a() {}\n// begin\nfn b() {}\n// end\nfn c() {}\n")
            .with_file("snippets/outer.md", "outer(<!--include inner.md-->)")
            .with_file("snippets/inner.md", "inner")
            .with_file("snippets/self.md", "again <!--include self.md-->")
    }

    fn apply(data: Value, text: &str) -> Result<String, MetadataError> {
        let (mut set, registry) = plugin_set(data);
        let document = Document::new("page.md", "page.html");
        let cache = cache();
        let ctx = PageContext {
            document: &document,
            cache: &cache,
        };
        SubstitutionEngine::new(&registry).apply(text, &mut set, &ctx, &mut VisitedMarkers::new())
    }

    fn config(extra: Value) -> Value {
        let mut item = json!({"markers": ["include"], "root-dir": "snippets"});
        if let (Some(item), Value::Object(extra)) = (item.as_object_mut(), extra) {
            item.extend(extra);
        }
        json!([item])
    }

    #[test]
    fn test_trim_modes() {
        assert_eq!(
            apply(config(json!({})), "[<!--include sample.txt-->]").unwrap(),
            "[Sample text 1   \n  Sample text 2]"
        );
        assert_eq!(
            apply(config(json!({"trim": "empty-lines"})), "[<!--include sample.txt-->]").unwrap(),
            "[   Sample text 1   \n  Sample text 2]"
        );
        assert_eq!(
            apply(config(json!({"trim": "none"})), "[<!--include sample.txt-->]").unwrap(),
            format!("[{SAMPLE}]")
        );
    }

    #[test]
    fn test_payload_object_overrides() {
        let text = r#"<!--include {"file": "code.rs", "start-marker": "// begin", "end-marker": "// end"}-->"#;

        assert_eq!(apply(config(json!({})), text).unwrap(), "fn b() {}");
    }

    #[test]
    fn test_configured_delimiters_and_empty_override() {
        let data = config(json!({"start-with": "fn b", "end-marker": "// end"}));

        assert_eq!(
            apply(data.clone(), "<!--include code.rs-->").unwrap(),
            "fn b() {}"
        );
        assert_eq!(
            apply(data, r#"<!--include {"file": "code.rs", "start-with": "", "end-marker": ""}-->"#)
                .unwrap(),
            "fn a() {}\n// begin\nfn b() {}\n// end\nfn c() {}"
        );
    }

    #[test]
    fn test_recursive_include() {
        let text = "<!--include outer.md-->";

        assert_eq!(apply(config(json!({})), text).unwrap(), "outer(<!--include inner.md-->)");
        assert_eq!(
            apply(config(json!({"recursive": true})), text).unwrap(),
            "outer(inner)"
        );
        assert_eq!(
            apply(
                config(json!({})),
                r#"<!--include {"file": "outer.md", "recursive": true}-->"#
            )
            .unwrap(),
            "outer(inner)"
        );
    }

    #[test]
    fn test_self_include_is_a_cycle() {
        let err = apply(config(json!({"recursive": true})), "<!--include self.md-->").unwrap_err();

        assert!(
            matches!(err, MetadataError::Cycle { ref token, .. } if token == "include:snippets/self.md")
        );
    }

    #[test]
    fn test_missing_file() {
        let err = apply(config(json!({})), "<!--include missing.md-->").unwrap_err();

        assert!(err.to_string().starts_with("Error processing page metadata block"));
    }

    #[test]
    fn test_invalid_payload_names_page() {
        let err = apply(config(json!({})), r#"<!--include {"path": "a"}-->"#).unwrap_err();

        assert!(err.to_string().contains("page: 'page.md'"));
    }

    #[test]
    fn test_duplicate_markers() {
        let mut plugin = IncludeFilePlugin::new();

        let err = plugin
            .accept_data(&json!([
                {"markers": ["include", "snippet"], "root-dir": "a"},
                {"markers": ["SNIPPET"], "root-dir": "b"}
            ]))
            .unwrap_err();

        assert!(err.to_string().contains("Marker duplication (case-insensitively): SNIPPET"));
    }

    #[test]
    fn test_strip_empty_lines() {
        assert_eq!(strip_empty_lines(" \n\t\n  a\n b \n \n"), "  a\n b ");
        assert_eq!(strip_empty_lines("x"), "x");
        assert_eq!(strip_empty_lines("a  \r\n"), "a  ");
        assert_eq!(strip_empty_lines(" \n "), "");
    }
}
