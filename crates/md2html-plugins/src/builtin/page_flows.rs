//! `page-flows`: ordered page sequences for navigation.
//!
//! A flow is a list of pages, given either as a plain array or as an
//! object with a `title`, the `groups` it belongs to and its `items`:
//!
//! ```json
//! {
//!   "sections": [{"link": "doc/intro.html", "title": "Intro"}],
//!   "guide": {"title": "Guide", "groups": ["all"], "items": [...]}
//! }
//! ```
//!
//! Documents join flows through their own `page-flows` setting; those pages
//! are appended after the configured ones.

use md2html_config::Document;
use md2html_render::{Variables, relativize_resource};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::state::PluginState;
use crate::{Plugin, PluginError};

pub(crate) const NAME: &str = "page-flows";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FlowObject {
    #[serde(default)]
    title: String,
    #[serde(default)]
    groups: Vec<String>,
    #[serde(default)]
    items: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, Default)]
struct PageFlow {
    title: String,
    groups: Vec<String>,
    pages: Vec<Map<String, Value>>,
}

/// Exposes each flow to templates with the current page's neighbours.
///
/// Per flow the variables hold `title`, `pages` (each with a relative
/// `link`, `title`, `current`, `external`, `first` and `last`), `previous`,
/// `current` and `next` (`null` when absent), `has_navigation` and
/// `not_empty`. A group variable is the list of its flows.
#[derive(Debug, Default)]
pub struct PageFlowsPlugin {
    state: PluginState,
    flows: Vec<(String, PageFlow)>,
}

impl PageFlowsPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    fn append(&mut self, data: &Value) -> Result<(), PluginError> {
        let Some(data) = data.as_object() else {
            return Err(PluginError::config(NAME, "data must be an object of page flows"));
        };
        for (name, value) in data {
            let flow = parse_flow(name, value)?;
            match self.flows.iter_mut().find(|(existing, _)| existing == name) {
                Some((_, existing)) => existing.pages.extend(flow.pages),
                None => self.flows.push((name.clone(), flow)),
            }
        }
        Ok(())
    }
}

fn parse_flow(name: &str, value: &Value) -> Result<PageFlow, PluginError> {
    let flow = match value {
        Value::Array(_) => FlowObject {
            items: Vec::deserialize(value).map_err(|e| flow_error(name, &e))?,
            ..FlowObject::default()
        },
        Value::Object(_) => FlowObject::deserialize(value).map_err(|e| flow_error(name, &e))?,
        _ => {
            return Err(PluginError::config(
                NAME,
                format!("page flow '{name}' must be an array or an object"),
            ));
        }
    };

    for item in &flow.items {
        if !item.get("link").is_some_and(Value::is_string) {
            return Err(PluginError::config(
                NAME,
                format!("every page of flow '{name}' needs a string 'link'"),
            ));
        }
    }

    Ok(PageFlow {
        title: flow.title,
        groups: flow.groups,
        pages: flow.items,
    })
}

fn flow_error(name: &str, e: &serde_json::Error) -> PluginError {
    PluginError::config(NAME, format!("invalid page flow '{name}': {e}"))
}

fn is_true(page: &Map<String, Value>, key: &str) -> bool {
    page.get(key).and_then(Value::as_bool).unwrap_or(false)
}

impl Plugin for PageFlowsPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn accept_data(&mut self, data: &Value) -> Result<(), PluginError> {
        self.state.configure(NAME)?;
        if data.is_null() {
            return Ok(());
        }
        self.append(data)
    }

    fn initialize(&mut self, data: Option<&Value>) -> Result<(), PluginError> {
        self.state.initialize(NAME)?;
        if let Some(data) = data {
            self.append(data)?;
        }

        for (name, _) in &self.flows {
            if self.flows.iter().any(|(_, flow)| flow.groups.contains(name)) {
                return Err(PluginError::config(
                    NAME,
                    format!("Variable duplication error: group name is '{name}'"),
                ));
            }
        }

        for (_, flow) in &mut self.flows {
            let count = flow.pages.len();
            for (index, page) in flow.pages.iter_mut().enumerate() {
                page.entry("external").or_insert(Value::Bool(false));
                page.entry("current").or_insert(Value::Bool(false));
                page.entry("title").or_insert_with(|| Value::String(String::new()));
                page.insert("first".to_owned(), Value::Bool(index == 0));
                page.insert("last".to_owned(), Value::Bool(index + 1 == count));
            }
        }
        Ok(())
    }

    fn is_blank(&self) -> bool {
        self.flows.is_empty()
    }

    fn variables(&self, document: &Document) -> Result<Variables, PluginError> {
        let output = document.output_location();
        let mut variables = Variables::new();
        let mut groups: Vec<(String, Vec<Value>)> = Vec::new();

        for (name, flow) in &self.flows {
            let value = flow_variables(flow, &output).map_err(|e| {
                PluginError::config(
                    NAME,
                    format!(
                        "Error recalculating relative links of page flow '{name}' for page '{output}': {e}"
                    ),
                )
            })?;
            for group in &flow.groups {
                match groups.iter_mut().find(|(existing, _)| existing == group) {
                    Some((_, flows)) => flows.push(value.clone()),
                    None => groups.push((group.clone(), vec![value.clone()])),
                }
            }
            variables.insert(name.clone(), value);
        }

        for (group, flows) in groups {
            variables.insert(group, Value::Array(flows));
        }
        Ok(variables)
    }
}

fn flow_variables(flow: &PageFlow, output: &str) -> Result<Value, md2html_render::RenderError> {
    let mut pages = Vec::with_capacity(flow.pages.len());
    let mut previous = None;
    let mut current = None;
    let mut next = None;

    for page in &flow.pages {
        if is_true(page, "external") {
            pages.push(Value::Object(page.clone()));
            continue;
        }

        let link = page.get("link").and_then(Value::as_str).unwrap_or_default();
        let is_current = link == output;
        let mut page = page.clone();
        page.insert("link".to_owned(), Value::String(relativize_resource(link, output)?));
        page.insert("current".to_owned(), Value::Bool(is_current));
        let page = Value::Object(page);

        if current.is_none() {
            if is_current {
                current = Some(page.clone());
            } else {
                previous = Some(page.clone());
            }
        } else if next.is_none() {
            next = Some(page.clone());
        }
        pages.push(page);
    }

    if current.is_none() {
        previous = None;
    }

    let has_navigation = previous.is_some() || next.is_some();
    Ok(json!({
        "title": flow.title,
        "not_empty": !pages.is_empty(),
        "pages": pages,
        "previous": previous,
        "current": current,
        "next": next,
        "has_navigation": has_navigation,
    }))
}
