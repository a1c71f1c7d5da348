//! The ordered collection of configured plugins.

use std::collections::HashSet;

use md2html_cache::ContentCache;
use md2html_config::{Document, Options};
use md2html_metadata::{
    HandlerId, HandlerRegistry, HandlerSet, MetadataBlock, MetadataError, MetadataOutput,
    VisitedMarkers,
};
use md2html_render::Variables;
use serde_json::{Map, Value};

use crate::builtin;
use crate::plugin::{
    FinalizeContext, OtherPlugins, PageContext, PageRecord, Plugin, PluginDataMap, PreInitContext,
};
use crate::PluginError;

/// Plugins of a run in registration order.
///
/// Also the [`HandlerSet`] behind the registry built by
/// [`build_registry`](Self::build_registry): handler ids index a table that
/// maps each registered marker to the plugin owning it.
#[derive(Default)]
pub struct PluginSet {
    plugins: Vec<Box<dyn Plugin>>,
    /// Plugin index per [`HandlerId`].
    handlers: Vec<usize>,
}

impl PluginSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate and configure the plugins named in `config`.
    ///
    /// Plugins are registered in the order of the map.
    pub fn from_config(config: &Map<String, Value>) -> Result<Self, PluginError> {
        let mut set = Self::new();
        for (name, data) in config {
            let mut plugin = builtin::create(name).ok_or_else(|| {
                PluginError::config(
                    name,
                    format!(
                        "Unknown plugin, expected one of: {}",
                        builtin::PLUGIN_NAMES.join(", ")
                    ),
                )
            })?;
            plugin.accept_data(data)?;
            set.push(plugin);
        }
        Ok(set)
    }

    /// Append a configured plugin.
    pub fn push(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Run `pre_initialize` on every plugin.
    ///
    /// `data` seeds the result; each plugin's contribution is merged in,
    /// objects key by key and arrays by concatenation.
    pub fn pre_initialize(
        &mut self,
        ctx: &PreInitContext<'_>,
        mut data: PluginDataMap,
    ) -> Result<PluginDataMap, PluginError> {
        for plugin in &mut self.plugins {
            for (key, value) in plugin.pre_initialize(ctx)? {
                match data.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        data.insert(key, value);
                    }
                }
            }
        }
        Ok(data)
    }

    /// Initialize every plugin with the data addressed to it by name.
    pub fn initialize(&mut self, data: &PluginDataMap) -> Result<(), PluginError> {
        for plugin in &mut self.plugins {
            let extra = data.get(plugin.name());
            plugin.initialize(extra)?;
        }
        Ok(())
    }

    /// Remove plugins that contribute nothing.
    pub fn drop_blank(&mut self) {
        self.plugins.retain(|plugin| {
            let blank = plugin.is_blank();
            if blank {
                tracing::debug!(plugin = plugin.name(), "Dropping blank plugin");
            }
            !blank
        });
    }

    /// Hand every document of the run to each plugin.
    pub fn accept_document_list(&mut self, documents: &[Document]) -> Result<(), PluginError> {
        for plugin in &mut self.plugins {
            plugin.accept_document_list(documents)?;
        }
        Ok(())
    }

    /// Build the handler registry from the plugins' markers.
    ///
    /// Fails when one plugin declares the same marker twice, ignoring case.
    pub fn build_registry(&mut self) -> Result<HandlerRegistry, PluginError> {
        self.handlers.clear();
        let mut builder = HandlerRegistry::builder();

        for (index, plugin) in self.plugins.iter().enumerate() {
            let mut seen = HashSet::new();
            for info in plugin.page_metadata_handlers() {
                let marker = info.marker.to_uppercase();
                if !seen.insert(marker.clone()) {
                    return Err(PluginError::config(
                        plugin.name(),
                        format!("Marker duplication (case-insensitively): {marker}"),
                    ));
                }
                let id = HandlerId(self.handlers.len());
                self.handlers.push(index);
                builder.register(&marker, info.start_only, id);
            }
        }

        Ok(builder.build())
    }

    /// Start `document` in every plugin.
    pub fn new_page(&mut self, document: &Document) -> Result<(), PluginError> {
        for plugin in &mut self.plugins {
            plugin.new_page(document)?;
        }
        Ok(())
    }

    /// Variables of every plugin, later plugins overriding earlier ones.
    pub fn variables(&self, document: &Document) -> Result<Variables, PluginError> {
        let mut variables = Variables::new();
        for plugin in &self.plugins {
            variables.extend(plugin.variables(document)?);
        }
        Ok(variables)
    }

    /// Call `f` on each plugin in order together with all the others.
    pub fn for_each_with_others<F>(&mut self, mut f: F) -> Result<(), PluginError>
    where
        F: FnMut(&mut dyn Plugin, OtherPlugins<'_>) -> Result<(), PluginError>,
    {
        for index in 0..self.plugins.len() {
            let (before, rest) = self.plugins.split_at_mut(index);
            let Some((current, after)) = rest.split_first_mut() else {
                break;
            };
            f(current.as_mut(), OtherPlugins::new(before, after))?;
        }
        Ok(())
    }

    /// Finalize every plugin once, in registration order.
    pub fn finalize_all(
        &mut self,
        cache: &dyn ContentCache,
        options: &Options,
        pages: &mut Vec<PageRecord>,
    ) -> Result<(), PluginError> {
        self.for_each_with_others(|plugin, others| {
            let mut ctx = FinalizeContext {
                others,
                cache,
                options,
                pages: &mut *pages,
            };
            plugin.finalize(&mut ctx)
        })
    }

    /// Names of the plugins in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|plugin| plugin.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl HandlerSet for PluginSet {
    type Context<'c> = PageContext<'c>;

    fn accept_page_metadata(
        &mut self,
        id: HandlerId,
        block: &MetadataBlock<'_>,
        ctx: &PageContext<'_>,
        visited: &VisitedMarkers,
    ) -> Result<MetadataOutput, MetadataError> {
        let index = self.handlers.get(id.0).copied();
        let plugin = index
            .and_then(|index| self.plugins.get_mut(index))
            .ok_or_else(|| MetadataError::content(format!("No plugin for handler {}", id.0)))?;
        plugin.accept_page_metadata(block, ctx, visited)
    }
}

fn merge_value(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(target), Value::Array(source)) => target.extend(source),
        (target, source) => *target = source,
    }
}
