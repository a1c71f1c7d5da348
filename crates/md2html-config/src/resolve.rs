//! Document resolution.
//!
//! Turns `documents` items into [`Document`]s: command line settings win
//! over the item, the item wins over the `default` section, and built-in
//! defaults fill the rest. `input-glob` items expand to one document per
//! matching file.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::argfile::DocumentRaw;
use crate::expand::expand_path;
use crate::{CliSettings, ConfigError, Document};

/// A documents item after merging, before glob expansion.
#[derive(Debug)]
struct MergedDocument {
    input: Option<PathBuf>,
    input_glob: Option<String>,
    input_root: Option<PathBuf>,
    output: Option<PathBuf>,
    output_root: Option<PathBuf>,
    title: String,
    code: Option<String>,
    template: Option<PathBuf>,
    link_css: Vec<String>,
    include_css: Vec<PathBuf>,
    no_css: bool,
    force: bool,
    verbose: bool,
    report: bool,
    page_flows: Vec<String>,
    sort_by_file_path: bool,
}

/// Resolves document items against the `default` section and CLI settings.
///
/// Kept after loading so plugins can resolve documents of their own (an
/// index page, for example) with the same rules as ordinary documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentResolver {
    defaults: DocumentRaw,
    cli: CliSettings,
    /// CLI settings without the per-document input and output overrides.
    synthetic_cli: CliSettings,
}

impl DocumentResolver {
    pub(crate) fn new(defaults: DocumentRaw, cli: CliSettings) -> Self {
        let synthetic_cli = CliSettings {
            input: None,
            input_glob: None,
            output: None,
            ..cli.clone()
        };
        Self {
            defaults,
            cli,
            synthetic_cli,
        }
    }

    /// Resolve one `documents` item; glob items may yield many documents.
    pub(crate) fn resolve(&self, item: &DocumentRaw) -> Result<Vec<Document>, ConfigError> {
        let merged = self.merge(item, &self.cli)?;

        if let Some(pattern) = &merged.input_glob {
            let files = expand_glob(
                merged.input_root.as_deref(),
                pattern,
                merged.sort_by_file_path,
            )?;
            return Ok(files.into_iter().map(|file| merged.finish(file)).collect());
        }

        let input = merged.input.clone().unwrap_or_default();
        Ok(vec![merged.finish(input)])
    }

    /// Resolve a document described by plugin configuration.
    ///
    /// The value uses the `documents` item format. Command line input and
    /// output overrides do not apply. Without an `input` the document is
    /// never read and its output path stands in for it.
    pub fn resolve_value(&self, value: &Value) -> Result<Document, ConfigError> {
        let mut item: DocumentRaw = serde_json::from_value(value.clone())?;
        if item.input_glob.is_some() {
            return Err(ConfigError::Validation(
                "'input-glob' cannot be used in a plugin-defined document".to_owned(),
            ));
        }
        if item.input.is_none() {
            item.input = Some(item.output.clone().ok_or_else(|| {
                ConfigError::Validation("plugin-defined document requires 'output'".to_owned())
            })?);
        }

        let merged = self.merge(&item, &self.synthetic_cli)?;
        let input = merged.input.clone().unwrap_or_default();
        Ok(merged.finish(input))
    }

    fn merge(&self, item: &DocumentRaw, cli: &CliSettings) -> Result<MergedDocument, ConfigError> {
        let defaults = &self.defaults;
        let describe = || item.describe();

        let input = path_value(
            cli.input.as_ref(),
            item.input.as_ref(),
            defaults.input.as_ref(),
            "input",
        )?;
        let input_glob = match cli.input_glob.as_ref() {
            Some(glob) => Some(glob.clone()),
            None => item
                .input_glob
                .as_ref()
                .or(defaults.input_glob.as_ref())
                .map(|glob| expand_path(glob, "input-glob"))
                .transpose()?,
        };

        match (&input, &input_glob) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::Validation(format!(
                    "Both input file GLOB and input file name are defined for {}",
                    describe()
                )));
            }
            (None, None) => {
                return Err(ConfigError::Validation(format!(
                    "None of the input file name or input file GLOB is specified for {}",
                    describe()
                )));
            }
            _ => {}
        }

        let output = path_value(
            cli.output.as_ref(),
            item.output.as_ref(),
            defaults.output.as_ref(),
            "output",
        )?;
        if input_glob.is_some() {
            if output.is_some() {
                return Err(ConfigError::Validation(format!(
                    "'output' cannot be used together with 'input-glob' in {}",
                    describe()
                )));
            }
            if item.code.is_some() {
                return Err(ConfigError::Validation(format!(
                    "'code' cannot be used together with 'input-glob' in {}",
                    describe()
                )));
            }
        }

        let verbose = cli
            .verbose
            .or(item.verbose)
            .or(defaults.verbose)
            .unwrap_or(false);
        let report = cli
            .report
            .or(item.report)
            .or(defaults.report)
            .unwrap_or(false);
        if verbose && report {
            return Err(ConfigError::Validation(format!(
                "Incompatible 'report' and 'verbose' parameters for {}",
                describe()
            )));
        }

        if item.page_flows.is_some() && item.add_page_flows.is_some() {
            return Err(ConfigError::Validation(format!(
                "Incompatible 'page-flows' and 'add-page-flows' parameters in {}",
                describe()
            )));
        }
        let mut page_flows = item
            .page_flows
            .clone()
            .or_else(|| defaults.page_flows.clone())
            .unwrap_or_default();
        page_flows.extend(item.add_page_flows.iter().flatten().cloned());

        let css = self.merge_css(item, cli)?;

        Ok(MergedDocument {
            input,
            input_glob,
            input_root: path_value(
                cli.input_root.as_ref(),
                item.input_root.as_ref(),
                defaults.input_root.as_ref(),
                "input-root",
            )?,
            output,
            output_root: path_value(
                cli.output_root.as_ref(),
                item.output_root.as_ref(),
                defaults.output_root.as_ref(),
                "output-root",
            )?,
            title: cli
                .title
                .clone()
                .or_else(|| item.title.clone())
                .or_else(|| defaults.title.clone())
                .unwrap_or_default(),
            code: item.code.clone(),
            template: path_value(
                cli.template.as_ref(),
                item.template.as_ref(),
                defaults.template.as_ref(),
                "template",
            )?,
            link_css: css.link,
            include_css: css.include,
            no_css: css.no_css,
            force: cli.force.or(item.force).or(defaults.force).unwrap_or(false),
            verbose,
            report,
            page_flows,
            sort_by_file_path: cli
                .sort_by_file_path
                .or(item.sort_by_file_path)
                .or(defaults.sort_by_file_path)
                .unwrap_or(false),
        })
    }

    /// Command line CSS settings replace the file's entirely.
    fn merge_css(&self, item: &DocumentRaw, cli: &CliSettings) -> Result<CssSettings, ConfigError> {
        let mut css = CssSettings::default();

        if cli.no_css == Some(true) || cli.link_css.is_some() || cli.include_css.is_some() {
            if cli.no_css == Some(true) {
                css.no_css = true;
            } else {
                css.link.extend(cli.link_css.iter().flatten().cloned());
                css.include.extend(cli.include_css.iter().flatten().cloned());
            }
            return Ok(css);
        }

        let has_css = [
            &item.link_css,
            &item.add_link_css,
            &item.include_css,
            &item.add_include_css,
        ]
        .iter()
        .any(|list| list.as_ref().is_some_and(|l| !l.is_empty()));
        if item.no_css == Some(true) && has_css {
            return Err(ConfigError::Validation(format!(
                "'no-css' parameter incompatible with one of ['link-css', 'add-link-css', \
                 'include-css', 'add-include-css'] in {}",
                item.describe()
            )));
        }

        let defaults = &self.defaults;
        css.no_css = item.no_css.or(defaults.no_css).unwrap_or(false);
        css.link.extend(
            item.link_css
                .as_ref()
                .or(defaults.link_css.as_ref())
                .into_iter()
                .flatten()
                .cloned(),
        );
        css.link
            .extend(item.add_link_css.iter().flatten().cloned());

        let include = item
            .include_css
            .as_ref()
            .or(defaults.include_css.as_ref())
            .into_iter()
            .flatten()
            .chain(item.add_include_css.iter().flatten());
        for path in include {
            css.include
                .push(PathBuf::from(expand_path(path, "include-css")?));
        }

        if !css.link.is_empty() || !css.include.is_empty() {
            css.no_css = false;
        }
        Ok(css)
    }
}

#[derive(Debug, Default)]
struct CssSettings {
    link: Vec<String>,
    include: Vec<PathBuf>,
    no_css: bool,
}

impl MergedDocument {
    /// Build the document for `input`, given relative to `input-root`.
    fn finish(&self, input: PathBuf) -> Document {
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| input.with_extension("html"));
        let input = match &self.input_root {
            Some(root) => root.join(input),
            None => input,
        };
        let output = match &self.output_root {
            Some(root) => root.join(output),
            None => output,
        };

        Document {
            input,
            output,
            title: self.title.clone(),
            code: self.code.clone(),
            template: self.template.clone(),
            link_css: self.link_css.clone(),
            include_css: self.include_css.clone(),
            no_css: self.no_css,
            force: self.force,
            verbose: self.verbose,
            report: self.report,
            page_flows: self.page_flows.clone(),
        }
    }
}

/// Pick the first configured path: CLI, then item, then defaults.
fn path_value(
    cli: Option<&PathBuf>,
    item: Option<&String>,
    default: Option<&String>,
    field: &str,
) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = cli {
        return Ok(Some(path.clone()));
    }
    item.or(default)
        .map(|value| expand_path(value, field).map(PathBuf::from))
        .transpose()
}

/// Expand `pattern` under `root`, returning paths relative to `root`.
fn expand_glob(
    root: Option<&Path>,
    pattern: &str,
    sort_by_file_path: bool,
) -> Result<Vec<PathBuf>, ConfigError> {
    let root = root.unwrap_or(Path::new(""));
    let full_pattern = root.join(pattern);
    let entries = glob::glob(&full_pattern.to_string_lossy()).map_err(|e| {
        ConfigError::Validation(format!("Invalid input-glob pattern '{pattern}': {e}"))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(glob::GlobError::into_error)?;
        if !path.is_file() {
            continue;
        }
        let relative = path.strip_prefix(root).map(Path::to_path_buf).ok();
        files.push(relative.unwrap_or(path));
    }

    if sort_by_file_path {
        files.sort();
    }
    tracing::debug!(pattern, count = files.len(), "expanded input glob");
    Ok(files)
}
