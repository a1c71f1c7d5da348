//! Configuration management for md2html.
//!
//! Loads an argument file (JSON with `#` comment lines, or TOML) and
//! merges it with command line settings into a [`RunConfig`]: global
//! options, the resolved [`Document`] list and the raw plugin
//! configuration.
//!
//! For every document setting the command line wins over the `documents`
//! item, and the item wins over the `default` section.
//!
//! ## Environment Variable Expansion
//!
//! Path values from argument files support `~`, `${VAR}` and
//! `${VAR:-default}` expansion. Expanded fields:
//! - `input`, `input-glob`, `input-root`
//! - `output`, `output-root`
//! - `template`, `include-css`, `add-include-css`

mod argfile;
mod document;
mod expand;
mod resolve;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};

use crate::argfile::{ArgFileRaw, DocumentRaw, OptionsRaw};
pub use document::Document;
pub use resolve::DocumentResolver;

/// CLI settings that override argument file values.
///
/// All fields are optional. Only non-None values override the argument file.
#[derive(Debug, Default, Clone)]
pub struct CliSettings {
    /// Input file; required when no argument file is given.
    pub input: Option<PathBuf>,
    /// Input file glob.
    pub input_glob: Option<String>,
    /// Root directory for input files.
    pub input_root: Option<PathBuf>,
    /// Output file.
    pub output: Option<PathBuf>,
    /// Root directory for output files.
    pub output_root: Option<PathBuf>,
    /// Page title.
    pub title: Option<String>,
    /// Page template.
    pub template: Option<PathBuf>,
    /// Stylesheets to link; replaces all file CSS settings.
    pub link_css: Option<Vec<String>>,
    /// Stylesheets to inline; replaces all file CSS settings.
    pub include_css: Option<Vec<PathBuf>>,
    /// Disable CSS; replaces all file CSS settings.
    pub no_css: Option<bool>,
    /// Rebuild up-to-date outputs.
    pub force: Option<bool>,
    /// Verbose progress output.
    pub verbose: Option<bool>,
    /// Print generated output paths.
    pub report: Option<bool>,
    /// Sort glob matches by file path.
    pub sort_by_file_path: Option<bool>,
}

/// Global options from the `options` section.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Options {
    /// Verbose run-level output.
    pub verbose: bool,
}

/// Fully loaded run configuration.
#[derive(Debug)]
pub struct RunConfig {
    /// Global options.
    pub options: Options,
    /// Documents in argument file order, globs expanded.
    pub documents: Vec<Document>,
    /// Plugin configuration by plugin name, in file order.
    pub plugins: Map<String, Value>,
    /// Resolver for documents defined in plugin configuration.
    pub resolver: DocumentResolver,
    /// Path to the argument file (set after loading).
    pub argument_file: Option<PathBuf>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Argument file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Argument file field (e.g., "input-root").
        field: String,
        /// Error message (e.g., "${`DOCS_ROOT`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl RunConfig {
    /// Load the run configuration.
    ///
    /// With an argument file, documents and plugins come from the file.
    /// Without one, the command line describes a single document and the
    /// `page-variables` plugin is enabled for start-of-page `VARIABLES`
    /// blocks.
    ///
    /// # Errors
    ///
    /// Returns error if the argument file doesn't exist, fails to parse, or
    /// the merged settings are inconsistent.
    pub fn load(argument_file: Option<&Path>, cli: &CliSettings) -> Result<Self, ConfigError> {
        let raw = if let Some(path) = argument_file {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            tracing::debug!(path = %path.display(), "loading argument file");
            ArgFileRaw::load(path)?
        } else {
            if cli.input.is_none() && cli.input_glob.is_none() {
                return Err(ConfigError::Validation(
                    "input file is required when no argument file is given".to_owned(),
                ));
            }
            cli_only_arguments()
        };

        let mut config = Self::from_raw(raw, cli)?;
        config.argument_file = argument_file.map(Path::to_path_buf);
        Ok(config)
    }

    /// Build the run configuration from JSON argument file content.
    ///
    /// # Errors
    ///
    /// Returns error if the content fails to parse or is inconsistent.
    pub fn from_json(content: &str, cli: &CliSettings) -> Result<Self, ConfigError> {
        Self::from_raw(ArgFileRaw::parse_json(content)?, cli)
    }

    fn from_raw(raw: ArgFileRaw, cli: &CliSettings) -> Result<Self, ConfigError> {
        let options = merge_options(&raw.options, cli)?;
        validate_defaults(&raw.default)?;

        let items = raw
            .documents
            .filter(|items| !items.is_empty())
            .ok_or_else(|| {
                ConfigError::Validation("'documents' must be a non-empty list".to_owned())
            })?;

        let resolver = DocumentResolver::new(raw.default, cli.clone());
        let mut documents = Vec::new();
        for item in &items {
            documents.extend(resolver.resolve(item)?);
        }
        validate_codes(&documents)?;

        Ok(Self {
            options,
            documents,
            plugins: raw.plugins,
            resolver,
            argument_file: None,
        })
    }

    /// Page flow entries contributed by documents.
    ///
    /// Maps each flow name to `{"link", "title"}` items in document order.
    pub fn document_page_flows(&self) -> Map<String, Value> {
        let mut flows = Map::new();
        for doc in &self.documents {
            for flow in &doc.page_flows {
                let entry = flows
                    .entry(flow.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(items) = entry {
                    items.push(json!({
                        "link": doc.output_location(),
                        "title": doc.title,
                    }));
                }
            }
        }
        flows
    }
}

fn cli_only_arguments() -> ArgFileRaw {
    let mut plugins = Map::new();
    plugins.insert(
        "page-variables".to_owned(),
        json!({"VARIABLES": {"only-at-page-start": true}}),
    );
    ArgFileRaw {
        documents: Some(vec![DocumentRaw::default()]),
        plugins,
        ..ArgFileRaw::default()
    }
}

fn merge_options(options: &OptionsRaw, cli: &CliSettings) -> Result<Options, ConfigError> {
    let verbose = options.verbose.or(cli.verbose).unwrap_or(false);
    if verbose && cli.report == Some(true) {
        return Err(ConfigError::Validation(
            "'report' parameter is incompatible with the 'verbose' option".to_owned(),
        ));
    }
    Ok(Options { verbose })
}

fn validate_defaults(defaults: &DocumentRaw) -> Result<(), ConfigError> {
    if defaults.no_css.is_some() && (defaults.link_css.is_some() || defaults.include_css.is_some())
    {
        return Err(ConfigError::Validation(
            "'no-css' parameter incompatible with 'link-css' and 'include-css' in the \
             'default' section"
                .to_owned(),
        ));
    }
    Ok(())
}

fn validate_codes(documents: &[Document]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for doc in documents {
        if let Some(code) = &doc.code {
            require_non_empty(code, "code")?;
            if !seen.insert(code.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate document code '{code}'"
                )));
            }
        }
    }
    Ok(())
}
