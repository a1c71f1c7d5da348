//! `index`: a back-of-book index page built from `<!--INDEX term-->` blocks.
//!
//! Each block becomes an anchor; the terms are collected per page into a
//! JSON cache file so that pages skipped as up to date keep their entries.
//! After all documents are processed the index page is regenerated when at
//! least one page was.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use md2html_config::Document;
use md2html_metadata::{MetadataBlock, MetadataError, MetadataOutput, VisitedMarkers};
use md2html_render::{PageWriter, relativize_resource};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::parse_payload;
use crate::plugin::{
    FinalizeContext, HandlerInfo, PageContext, PageRecord, PageStatus, PluginDataMap,
    PreInitContext,
};
use crate::state::PluginState;
use crate::{Plugin, PluginError};

pub(crate) const NAME: &str = "index";

const MARKER: &str = "INDEX";
const ENTRY_ANCHOR_PREFIX: &str = "index_entry_";
const LETTER_ID_PREFIX: &str = "index_letter_";

/// One occurrence of a term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct IndexEntry {
    entry: String,
    link: String,
    #[serde(default)]
    title: String,
}

/// Entries per page output location.
type IndexCache = BTreeMap<String, Vec<IndexEntry>>;

#[derive(Debug, Default)]
pub struct IndexPlugin {
    state: PluginState,
    /// The index page in `documents` item form, minus the plugin settings.
    document_data: Map<String, Value>,
    index_cache_file: PathBuf,
    index_cache_relative: bool,
    letters: bool,
    letters_block: bool,

    document: Option<Document>,
    cache: IndexCache,
    /// Pages processed during this run.
    page_resets: BTreeSet<String>,
    current_link: String,
    anchor_number: usize,
    finalized: bool,
}

impl IndexPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    fn document(&self) -> Result<&Document, PluginError> {
        self.document.as_ref().ok_or_else(|| {
            PluginError::Contract(format!("plugin '{NAME}' used before pre-initialization"))
        })
    }

    fn load_cache(&mut self) -> Result<(), PluginError> {
        let path = &self.index_cache_file;
        if !path.exists() {
            return Ok(());
        }
        let content = fs::read_to_string(path).map_err(|source| PluginError::Io {
            context: "Cannot read index cache",
            path: path.clone(),
            source,
        })?;
        self.cache = serde_json::from_str(&content).map_err(|source| PluginError::Json {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), pages = self.cache.len(), "Index cache loaded");
        Ok(())
    }

    fn save_cache(&self) -> Result<(), PluginError> {
        let path = &self.index_cache_file;
        let io_error = |source| PluginError::Io {
            context: "Cannot write index cache",
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let content = serde_json::to_string_pretty(&self.cache).map_err(|source| {
            PluginError::Json {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(path, content).map_err(io_error)
    }
}

impl Plugin for IndexPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn accept_data(&mut self, data: &Value) -> Result<(), PluginError> {
        self.state.configure(NAME)?;
        let Some(data) = data.as_object() else {
            return Err(PluginError::config(NAME, "data must be an object"));
        };
        let mut document_data = data.clone();

        let cache_file = document_data
            .remove("index-cache")
            .ok_or_else(|| PluginError::config(NAME, "'index-cache' is required"))?;
        self.index_cache_file = PathBuf::deserialize(&cache_file)
            .map_err(|e| PluginError::config(NAME, format!("'index-cache': {e}")))?;
        self.index_cache_relative = take_flag(&mut document_data, "index-cache-relative")?;
        self.letters = take_flag(&mut document_data, "letters")?;
        self.letters_block = take_flag(&mut document_data, "letters-block")?;

        self.document_data = document_data;
        Ok(())
    }

    fn pre_initialize(&mut self, ctx: &PreInitContext<'_>) -> Result<PluginDataMap, PluginError> {
        let document = ctx
            .resolver
            .resolve_value(&Value::Object(self.document_data.clone()))?;

        if self.index_cache_relative {
            let base = document.output.parent().unwrap_or_else(|| Path::new(""));
            self.index_cache_file = base.join(&self.index_cache_file);
        }
        self.document = Some(document);
        Ok(PluginDataMap::new())
    }

    fn initialize(&mut self, _data: Option<&Value>) -> Result<(), PluginError> {
        self.state.initialize(NAME)?;
        self.document()?;
        self.load_cache()
    }

    fn page_metadata_handlers(&self) -> Vec<HandlerInfo> {
        vec![HandlerInfo::anywhere(MARKER)]
    }

    fn accept_page_metadata(
        &mut self,
        block: &MetadataBlock<'_>,
        ctx: &PageContext<'_>,
        _visited: &VisitedMarkers,
    ) -> Result<MetadataOutput, MetadataError> {
        let payload = block.metadata.trim();
        let terms: Vec<String> = if payload.starts_with('[') {
            parse_payload("index entry", payload)?
        } else {
            vec![payload.to_owned()]
        };

        self.anchor_number += 1;
        let anchor = format!("{ENTRY_ANCHOR_PREFIX}{}", self.anchor_number);
        let entries = self
            .cache
            .entry(ctx.document.output_location())
            .or_default();
        for term in terms {
            entries.push(IndexEntry {
                entry: term.trim().to_owned(),
                link: format!("{}#{anchor}", self.current_link),
                title: ctx.document.title.clone(),
            });
        }

        Ok(MetadataOutput::text(format!("<a name=\"{anchor}\"></a>")))
    }

    fn new_page(&mut self, document: &Document) -> Result<(), PluginError> {
        let index_output = self.document()?.output_location();
        let page = document.output_location();
        self.current_link = relativize_resource(&page, &index_output)?;
        self.cache.insert(page.clone(), Vec::new());
        self.page_resets.insert(page);
        self.anchor_number = 0;
        Ok(())
    }

    fn finalize(&mut self, ctx: &mut FinalizeContext<'_>) -> Result<(), PluginError> {
        self.state.require_initialized(NAME)?;
        if self.finalized {
            return Err(PluginError::Contract(format!(
                "plugin '{NAME}' finalized more than once"
            )));
        }
        self.finalized = true;
        let document = self.document()?.clone();

        if self.page_resets.is_empty() {
            tracing::debug!(output = %document.output.display(), "Index is up to date");
            ctx.pages.push(PageRecord {
                document,
                status: PageStatus::UpToDate,
            });
            return Ok(());
        }

        ctx.others.new_page(&document)?;
        let variables = ctx.others.variables(&document)?;
        let content = generate_content(&self.cache, self.letters, self.letters_block);
        PageWriter::new(ctx.cache).write(&document, &content, variables)?;
        self.save_cache()?;

        tracing::info!(output = %document.output.display(), "Index generated");
        ctx.pages.push(PageRecord {
            document,
            status: PageStatus::Generated,
        });
        self.page_resets.clear();
        Ok(())
    }
}

fn take_flag(data: &mut Map<String, Value>, key: &str) -> Result<bool, PluginError> {
    match data.remove(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(flag)) => Ok(flag),
        Some(other) => Err(PluginError::config(
            NAME,
            format!("'{key}' must be a boolean, got {other}"),
        )),
    }
}

/// Render the index body.
///
/// Terms are sorted case-insensitively; a term found once links by its
/// name, a term found several times lists numbered links.
fn generate_content(cache: &IndexCache, letters: bool, letters_block: bool) -> String {
    let mut terms: Vec<(&str, Vec<&IndexEntry>)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for entry in cache.values().flatten() {
        match positions.get(entry.entry.as_str()) {
            Some(&index) => terms[index].1.push(entry),
            None => {
                positions.insert(entry.entry.as_str(), terms.len());
                terms.push((entry.entry.as_str(), vec![entry]));
            }
        }
    }
    terms.sort_by_cached_key(|(term, _)| term.to_lowercase());

    let mut content = String::new();
    let mut letter_links = String::new();
    let mut current_letter = String::new();

    for (term, links) in &terms {
        if letters || letters_block {
            let letter: String = term.chars().take(1).flat_map(char::to_uppercase).collect();
            if letter != current_letter {
                current_letter = letter;
                let id = format!("{LETTER_ID_PREFIX}{current_letter}");
                if letters {
                    let _ = writeln!(
                        content,
                        "<p class=\"index-letter\" id=\"{id}\">{current_letter}</p>"
                    );
                } else {
                    let _ = writeln!(content, "<a name=\"{id}\"></a>");
                }
                if letters_block {
                    let _ = write!(letter_links, "<a href=\"#{id}\">{current_letter}</a> ");
                }
            }
        }

        if let [single] = links.as_slice() {
            let _ = writeln!(
                content,
                "<p class=\"index-entry\"><a href=\"{}\"{}>{term}</a></p>",
                single.link,
                title_attribute(&single.title)
            );
        } else {
            let numbered: Vec<String> = links
                .iter()
                .enumerate()
                .map(|(i, entry)| {
                    format!(
                        "<a href=\"{}\"{}>{}</a>",
                        entry.link,
                        title_attribute(&entry.title),
                        i + 1
                    )
                })
                .collect();
            let _ = writeln!(
                content,
                "<p class=\"index-entry\">{term}: {}</p>",
                numbered.join(", ")
            );
        }
    }

    let mut result = String::new();
    if !letter_links.is_empty() {
        let _ = writeln!(result, "<p class=\"index_letters\">{letter_links}</p>");
    }
    let _ = write!(result, "<div class=\"index-content\">\n{content}\n</div>");
    result
}

fn title_attribute(title: &str) -> String {
    if title.is_empty() {
        String::new()
    } else {
        format!(" title=\"{}\"", escape_html(title))
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
