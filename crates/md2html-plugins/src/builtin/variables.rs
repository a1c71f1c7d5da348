//! `variables`: fixed template variables for every page.

use md2html_config::Document;
use md2html_render::Variables;
use serde_json::Value;

use crate::config::parse_data;
use crate::state::PluginState;
use crate::{Plugin, PluginError};

pub(crate) const NAME: &str = "variables";

#[derive(Debug, Default)]
pub struct VariablesPlugin {
    state: PluginState,
    variables: Variables,
}

impl VariablesPlugin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plugin for VariablesPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn accept_data(&mut self, data: &Value) -> Result<(), PluginError> {
        self.state.configure(NAME)?;
        self.variables = parse_data(NAME, data)?;
        Ok(())
    }

    fn initialize(&mut self, _data: Option<&Value>) -> Result<(), PluginError> {
        self.state.initialize(NAME)
    }

    fn is_blank(&self) -> bool {
        self.variables.is_empty()
    }

    fn variables(&self, _document: &Document) -> Result<Variables, PluginError> {
        Ok(self.variables.clone())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_variables_are_static() {
        let mut plugin = VariablesPlugin::new();
        plugin
            .accept_data(&json!({"logo": "<b>md2html</b>", "year": 2024}))
            .unwrap();

        let first = plugin.variables(&Document::new("a.md", "a.html")).unwrap();
        let second = plugin.variables(&Document::new("b/c.md", "b/c.html")).unwrap();

        assert_eq!(first, second);
        assert_eq!(Value::Object(first), json!({"logo": "<b>md2html</b>", "year": 2024}));
    }

    #[test]
    fn test_blank_when_empty() {
        let mut plugin = VariablesPlugin::new();
        plugin.accept_data(&json!({})).unwrap();

        assert!(plugin.is_blank());
    }

    #[test]
    fn test_rejects_non_object() {
        let mut plugin = VariablesPlugin::new();

        assert!(plugin.accept_data(&json!(["a"])).is_err());
    }
}
