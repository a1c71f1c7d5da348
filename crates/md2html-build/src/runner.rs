//! Whole-run lifecycle.

use md2html_config::{Document, Options, RunConfig};
use md2html_metadata::HandlerRegistry;
use md2html_plugins::builtin::PageFlowsPlugin;
use md2html_plugins::{PageRecord, Plugin, PluginDataMap, PluginSet, PreInitContext};
use serde_json::Value;

use crate::error::BuildError;
use crate::pipeline::{Services, finalize_all, process};

/// A configured run, ready to process its documents.
///
/// [`Runner::new`] drives the plugins through configuration,
/// pre-initialization, initialization, blank removal, registry building and
/// document list delivery. [`Runner::run`] then processes every document in
/// order and finalizes the plugins.
pub struct Runner {
    options: Options,
    documents: Vec<Document>,
    plugins: PluginSet,
    registry: HandlerRegistry,
}

impl Runner {
    pub fn new(config: RunConfig) -> Result<Self, BuildError> {
        let mut plugins = PluginSet::from_config(&config.plugins)?;

        let flows = config.document_page_flows();
        let mut seed = PluginDataMap::new();
        if !flows.is_empty() {
            let mut page_flows = PageFlowsPlugin::new();
            let name = page_flows.name().to_owned();
            if !plugins.names().contains(&name.as_str()) {
                page_flows.accept_data(&Value::Null)?;
                plugins.push(Box::new(page_flows));
            }
            seed.insert(name, Value::Object(flows));
        }

        let ctx = PreInitContext {
            resolver: &config.resolver,
            options: &config.options,
        };
        let data = plugins.pre_initialize(&ctx, seed)?;
        plugins.initialize(&data)?;
        plugins.drop_blank();
        let registry = plugins.build_registry()?;
        plugins.accept_document_list(&config.documents)?;

        tracing::debug!(
            plugins = ?plugins.names(),
            documents = config.documents.len(),
            "Run prepared"
        );

        Ok(Self {
            options: config.options,
            documents: config.documents,
            plugins,
            registry,
        })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn plugins(&self) -> &PluginSet {
        &self.plugins
    }

    /// Process every document, then finalize the plugins.
    ///
    /// `on_page` sees each record as soon as it is known; the returned list
    /// holds them all, plugin-generated pages last.
    pub fn run<F>(
        mut self,
        services: &Services<'_>,
        mut on_page: F,
    ) -> Result<Vec<PageRecord>, BuildError>
    where
        F: FnMut(&PageRecord),
    {
        let mut pages = Vec::with_capacity(self.documents.len());
        for document in &self.documents {
            let status = process(document, &mut self.plugins, &self.registry, services)?;
            let record = PageRecord {
                document: document.clone(),
                status,
            };
            on_page(&record);
            pages.push(record);
        }

        let processed = pages.len();
        finalize_all(&mut self.plugins, &self.options, services, &mut pages)?;
        for record in &pages[processed..] {
            on_page(record);
        }
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::time::SystemTime;

    use md2html_cache::FileContentCache;
    use md2html_config::CliSettings;
    use md2html_plugins::PageStatus;
    use md2html_render::CommonMarkConverter;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::gate::tests::write_aged;

    fn run_config(dir: &Path) -> RunConfig {
        let root = dir.to_string_lossy();
        let content = json!({
            "default": {
                "input-root": root,
                "output-root": format!("{root}/site"),
                "template": format!("{root}/page.html"),
            },
            "documents": [
                {"input": "a.md", "title": "A", "code": "a", "page-flows": ["sections"]},
                {"input": "b.md", "title": "B", "page-flows": ["sections"]}
            ],
            "plugins": {
                "variables": {"product": "Widget"},
                "page-variables": {},
                "page-links": {},
                "replace": [{"markers": ["warn"], "replace-with": "**${1}**"}],
                "index": {
                    "index-cache": "index_cache.json",
                    "index-cache-relative": true,
                    "output": format!("{root}/site/index.html"),
                    "title": "Index"
                }
            }
        });
        RunConfig::from_json(&content.to_string(), &CliSettings::default()).unwrap()
    }

    fn write_sources(dir: &Path, now: SystemTime) {
        write_aged(
            &dir.join("page.html"),
            "{{ title }}|{{ product }}|{% if sections.next %}next={{ sections.next.link }}|{% endif %}{{ content }}",
            now,
            3600,
        );
        write_aged(
            &dir.join("a.md"),
            "<!--VARIABLES {\"title\": \"Alpha\"}-->\n<!--INDEX apple-->Intro <!--warn careful-->\n",
            now,
            3600,
        );
        write_aged(
            &dir.join("b.md"),
            "Back to <!--page a-->. <!--INDEX apple-->\n",
            now,
            3600,
        );
    }

    fn build(dir: &Path) -> Vec<PageRecord> {
        let runner = Runner::new(run_config(dir)).unwrap();
        let cache = FileContentCache::new();
        let converter = CommonMarkConverter::new();
        runner
            .run(&Services::new(&cache, &converter), |_| {})
            .unwrap()
    }

    fn statuses(pages: &[PageRecord]) -> Vec<(String, PageStatus)> {
        pages
            .iter()
            .map(|page| {
                let name = page.document.output.file_name().unwrap();
                (name.to_string_lossy().into_owned(), page.status)
            })
            .collect()
    }

    #[test]
    fn test_full_run() {
        let dir = tempfile::tempdir().unwrap();
        write_sources(dir.path(), SystemTime::now());

        let pages = build(dir.path());

        assert_eq!(
            statuses(&pages),
            [
                ("a.html".to_owned(), PageStatus::Generated),
                ("b.html".to_owned(), PageStatus::Generated),
                ("index.html".to_owned(), PageStatus::Generated),
            ]
        );
        let site = dir.path().join("site");
        assert_eq!(
            fs::read_to_string(site.join("a.html")).unwrap(),
            "Alpha|Widget|next=b.html|<p><a name=\"index_entry_1\"></a>Intro <strong>careful</strong></p>\n"
        );
        assert_eq!(
            fs::read_to_string(site.join("b.html")).unwrap(),
            "B|Widget|<p>Back to a.html. <a name=\"index_entry_1\"></a></p>\n"
        );
        let index = fs::read_to_string(site.join("index.html")).unwrap();
        assert!(index.starts_with("Index|Widget|"));
        assert!(index.contains(
            "<p class=\"index-entry\">apple: <a href=\"a.html#index_entry_1\" title=\"A\">1</a>, \
             <a href=\"b.html#index_entry_1\" title=\"B\">2</a></p>"
        ));
        assert!(site.join("index_cache.json").exists());
    }

    #[test]
    fn test_second_run_skips_everything() {
        let dir = tempfile::tempdir().unwrap();
        write_sources(dir.path(), SystemTime::now());
        build(dir.path());

        let mut seen = Vec::new();
        let runner = Runner::new(run_config(dir.path())).unwrap();
        let cache = FileContentCache::new();
        let converter = CommonMarkConverter::new();
        let pages = runner
            .run(&Services::new(&cache, &converter), |page| {
                seen.push(page.status);
            })
            .unwrap();

        assert_eq!(
            statuses(&pages),
            [
                ("a.html".to_owned(), PageStatus::UpToDate),
                ("b.html".to_owned(), PageStatus::UpToDate),
                ("index.html".to_owned(), PageStatus::UpToDate),
            ]
        );
        assert_eq!(seen, [PageStatus::UpToDate; 3]);
    }

    #[test]
    fn test_document_flows_add_page_flows_plugin() {
        let dir = tempfile::tempdir().unwrap();
        write_sources(dir.path(), SystemTime::now());

        let runner = Runner::new(run_config(dir.path())).unwrap();

        assert_eq!(
            runner.plugins().names(),
            ["variables", "page-variables", "page-links", "replace", "index", "page-flows"]
        );
        assert_eq!(runner.documents().len(), 2);
    }

    #[test]
    fn test_wrapped_pages_are_reported_last() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_string_lossy();
        fs::write(dir.path().join("page.md"), "Source: <!--code main.rs-->\n").unwrap();
        fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
        let content = json!({
            "default": {"input-root": root, "output-root": format!("{root}/site"), "no-css": true},
            "documents": [{"input": "page.md"}],
            "plugins": {"wrap-code": {"code": {"output-root": format!("{root}/site/src"), "style": "rust"}}}
        });
        let config = RunConfig::from_json(&content.to_string(), &CliSettings::default()).unwrap();
        let cache = FileContentCache::new();
        let converter = CommonMarkConverter::new();

        let mut seen = Vec::new();
        let pages = Runner::new(config)
            .unwrap()
            .run(&Services::new(&cache, &converter), |page| {
                seen.push(page.document.output.clone());
            })
            .unwrap();

        assert_eq!(
            statuses(&pages),
            [
                ("page.html".to_owned(), PageStatus::Generated),
                ("main.rs.html".to_owned(), PageStatus::Generated),
            ]
        );
        assert_eq!(seen[1], dir.path().join("site/src/main.rs.html"));
        let page = fs::read_to_string(dir.path().join("site/page.html")).unwrap();
        assert!(page.contains("Source: src/main.rs.html"));
        let wrapped = fs::read_to_string(&seen[1]).unwrap();
        assert!(wrapped.contains("<code class=\"language-rust\">fn main() {}"));
    }

    #[test]
    fn test_unknown_plugin() {
        let content = json!({
            "documents": [{"input": "a.md"}],
            "plugins": {"highlight": {}}
        });
        let config = RunConfig::from_json(&content.to_string(), &CliSettings::default()).unwrap();

        let err = Runner::new(config).err().unwrap();

        assert!(matches!(err, BuildError::Plugin(_)));
        assert!(err.to_string().contains("Unknown plugin"));
    }
}
