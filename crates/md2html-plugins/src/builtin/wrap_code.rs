//! `wrap-code`: pages that show a source file as a fenced code block.
//!
//! `<!--MARKER path/to/file.java-->` is replaced with the link to the
//! wrapper page of that file. Each marker has its own input and output
//! roots, fence style and template variables; the wrapper pages themselves
//! are written once every document has been processed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use md2html_config::Document;
use md2html_metadata::{MetadataBlock, MetadataError, MetadataOutput, VisitedMarkers};
use md2html_render::{CommonMarkConverter, MarkdownConverter, PageWriter, relativize_resource};
use serde_json::{Map, Value};

use crate::config::unique_markers;
use crate::plugin::{
    FinalizeContext, HandlerInfo, PageContext, PageRecord, PageStatus, PluginDataMap,
    PreInitContext,
};
use crate::state::PluginState;
use crate::{Plugin, PluginError};

pub(crate) const NAME: &str = "wrap-code";

/// File name resolved in place of the wrapped file to find a marker's roots.
const ROOT_PLACEHOLDER: &str = "wrapped";

const FENCE: &str = "````";

#[derive(Debug, Default)]
struct MarkerSettings {
    marker: String,
    style: String,
    variables: Map<String, Value>,
    /// The marker's settings in `documents` item form.
    document_data: Map<String, Value>,
    /// Resolved settings; `input` and `output` hold the roots.
    roots: Option<Document>,
}

/// A wrapper page found during the run.
#[derive(Debug)]
struct WrappedFile {
    /// Index into the marker settings.
    marker: usize,
    /// The payload path, as written in the block.
    path: String,
    document: Document,
    /// `None` when the wrapper page is up to date.
    source: Option<Rc<str>>,
}

#[derive(Debug, Default)]
pub struct WrapCodePlugin {
    state: PluginState,
    markers: Vec<MarkerSettings>,
    /// Output location per `MARKER|input` already handled.
    processed: HashMap<String, String>,
    pending: Vec<WrappedFile>,
}

impl WrapCodePlugin {
    pub fn new() -> Self {
        Self::default()
    }

    fn wrap(
        &mut self,
        marker: usize,
        path: &str,
        ctx: &PageContext<'_>,
    ) -> Result<String, MetadataError> {
        let settings = &self.markers[marker];
        let roots = settings.roots.as_ref().ok_or_else(|| {
            MetadataError::content(format!("plugin '{NAME}' used before pre-initialization"))
        })?;

        let input = roots.input.join(path);
        let key = format!("{}|{}", settings.marker, location(&input));
        if let Some(output) = self.processed.get(&key) {
            return Ok(output.clone());
        }

        let file_name = Path::new(path)
            .file_name()
            .map_or_else(|| path.to_owned(), |name| name.to_string_lossy().into_owned());
        let document = Document {
            input,
            output: roots.output.join(format!("{path}.html")),
            title: file_name,
            ..roots.clone()
        };

        let source = if !document.force && document.output_is_newer() {
            tracing::debug!(
                output = %document.output.display(),
                "Wrapped output file is up to date"
            );
            None
        } else {
            let source = ctx.cache.read(&document.input).map_err(|e| {
                MetadataError::content(format!("Error processing page metadata block: {e}"))
            })?;
            Some(source)
        };

        let output = document.output_location();
        self.processed.insert(key, output.clone());
        self.pending.push(WrappedFile {
            marker,
            path: path.to_owned(),
            document,
            source,
        });
        Ok(output)
    }
}

impl Plugin for WrapCodePlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn accept_data(&mut self, data: &Value) -> Result<(), PluginError> {
        self.state.configure(NAME)?;
        let data = match data {
            Value::Null => return Ok(()),
            Value::Object(data) => data,
            _ => return Err(PluginError::config(NAME, "data must be an object")),
        };

        let markers = unique_markers(NAME, data.keys().map(String::as_str))?;
        for (marker, settings) in markers.into_iter().zip(data.values()) {
            let Some(settings) = settings.as_object() else {
                return Err(PluginError::config(
                    NAME,
                    format!("settings of marker '{marker}' must be an object"),
                ));
            };
            let mut document_data = settings.clone();

            let style = match document_data.remove("style") {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(style)) => style,
                Some(other) => {
                    return Err(PluginError::config(
                        NAME,
                        format!("'style' of marker '{marker}' must be a string, got {other}"),
                    ));
                }
            };
            let variables = match document_data.remove("variables") {
                None | Some(Value::Null) => Map::new(),
                Some(Value::Object(variables)) => variables,
                Some(other) => {
                    return Err(PluginError::config(
                        NAME,
                        format!("'variables' of marker '{marker}' must be an object, got {other}"),
                    ));
                }
            };
            if let Some(key) = ["input", "input-glob", "output"]
                .into_iter()
                .find(|key| document_data.contains_key(*key))
            {
                return Err(PluginError::config(
                    NAME,
                    format!("'{key}' cannot be set for marker '{marker}'"),
                ));
            }

            self.markers.push(MarkerSettings {
                marker,
                style,
                variables,
                document_data,
                roots: None,
            });
        }
        Ok(())
    }

    fn pre_initialize(&mut self, ctx: &PreInitContext<'_>) -> Result<PluginDataMap, PluginError> {
        for settings in &mut self.markers {
            let mut item = settings.document_data.clone();
            item.insert("input".to_owned(), Value::from(ROOT_PLACEHOLDER));
            item.insert("output".to_owned(), Value::from(ROOT_PLACEHOLDER));
            let resolved = ctx.resolver.resolve_value(&Value::Object(item))?;

            settings.roots = Some(Document {
                input: parent(&resolved.input),
                output: parent(&resolved.output),
                ..resolved
            });
        }
        Ok(PluginDataMap::new())
    }

    fn initialize(&mut self, _data: Option<&Value>) -> Result<(), PluginError> {
        self.state.initialize(NAME)?;
        if self.markers.iter().any(|settings| settings.roots.is_none()) {
            return Err(PluginError::Contract(format!(
                "plugin '{NAME}' initialized before pre-initialization"
            )));
        }
        Ok(())
    }

    fn is_blank(&self) -> bool {
        self.markers.is_empty()
    }

    fn page_metadata_handlers(&self) -> Vec<HandlerInfo> {
        self.markers
            .iter()
            .map(|settings| HandlerInfo::anywhere(&settings.marker))
            .collect()
    }

    fn accept_page_metadata(
        &mut self,
        block: &MetadataBlock<'_>,
        ctx: &PageContext<'_>,
        _visited: &VisitedMarkers,
    ) -> Result<MetadataOutput, MetadataError> {
        let marker = block.marker.to_uppercase();
        let Some(index) = self.markers.iter().position(|s| s.marker == marker) else {
            return Ok(MetadataOutput::text(block.metadata_block));
        };

        let output = self.wrap(index, block.metadata.trim(), ctx)?;
        relativize_resource(&output, &ctx.document.output_location())
            .map(MetadataOutput::Text)
            .map_err(|e| MetadataError::content(format!("Plugin '{NAME}': {e}")))
    }

    fn finalize(&mut self, ctx: &mut FinalizeContext<'_>) -> Result<(), PluginError> {
        self.state.require_initialized(NAME)?;
        let converter = CommonMarkConverter::new();
        let writer = PageWriter::new(ctx.cache);

        for wrapped in self.pending.drain(..) {
            let status = match &wrapped.source {
                Some(source) => {
                    let settings = &self.markers[wrapped.marker];
                    let text = format!("{FENCE}{}\n{source}\n{FENCE}", settings.style);
                    let content = converter.convert(&text);

                    let mut variables = ctx.others.variables(&wrapped.document)?;
                    variables.extend(settings.variables.clone());
                    let file_name = Value::from(wrapped.document.title.as_str());
                    variables.insert("title".to_owned(), file_name.clone());
                    variables.insert("wrap_code_file_name".to_owned(), file_name);
                    variables.insert(
                        "wrap_code_path".to_owned(),
                        Value::from(wrapped.path.as_str()),
                    );
                    writer.write(&wrapped.document, &content, variables)?;

                    tracing::info!(
                        output = %wrapped.document.output.display(),
                        "Wrapped output file generated"
                    );
                    PageStatus::Generated
                }
                None => PageStatus::UpToDate,
            };
            ctx.pages.push(PageRecord {
                document: wrapped.document,
                status,
            });
        }
        Ok(())
    }
}

fn parent(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

fn location(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
