//! Page template rendering.
//!
//! Templates use minijinja syntax. Every value is HTML-escaped except the
//! variables listed in [`SAFE_VARIABLES`], which already hold markup.
//!
//! Templates written for mustache need these changes:
//!
//! | mustache | minijinja |
//! |---|---|
//! | `{{{content}}}`, `{{&styles}}` | `{{ content }}`, `{{ styles }}` |
//! | `{{#flow.has_navigation}}…{{/flow.has_navigation}}` | `{% if flow.has_navigation %}…{% endif %}` |
//! | `{{^flow.not_empty}}…{{/flow.not_empty}}` | `{% if not flow.not_empty %}…{% endif %}` |
//! | `{{#flow.pages}}{{link}}{{/flow.pages}}` | `{% for page in flow.pages %}{{ page.link }}{% endfor %}` |
//!
//! Inside a loop the current item is named explicitly, and a missing
//! variable renders as an empty string in both.

use std::collections::BTreeMap;

use minijinja::{AutoEscape, Environment, Value};

use crate::RenderError;

/// Template variables, merged from the writer and plugins.
pub type Variables = serde_json::Map<String, serde_json::Value>;

/// Built-in page template.
pub const DEFAULT_TEMPLATE: &str = include_str!("../assets/default.html");

/// Name the built-in template is reported under.
pub const DEFAULT_TEMPLATE_NAME: &str = "default.html";

/// Built-in stylesheet, inlined when a document configures no CSS.
pub const DEFAULT_CSS: &str = include_str!("../assets/default.css");

/// Variables inserted without escaping.
pub const SAFE_VARIABLES: &[&str] = &["content", "styles"];

/// Renders page templates.
#[derive(Debug)]
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        Self { env }
    }
}

impl TemplateRenderer {
    /// Create a renderer with HTML auto-escaping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Render template `source` with `variables`.
    ///
    /// `name` identifies the template in error messages.
    pub fn render(
        &self,
        name: &str,
        source: &str,
        variables: &Variables,
    ) -> Result<String, RenderError> {
        let context: BTreeMap<&str, Value> = variables
            .iter()
            .map(|(key, value)| (key.as_str(), to_template_value(key, value)))
            .collect();

        self.env
            .render_named_str(name, source, context)
            .map_err(|source| RenderError::Template {
                name: name.to_owned(),
                source,
            })
    }
}

fn to_template_value(key: &str, value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::String(text) if SAFE_VARIABLES.contains(&key) => {
            Value::from_safe_string(text.clone())
        }
        other => Value::from_serialize(other),
    }
}
