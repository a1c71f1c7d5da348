//! Plugins for md2html.
//!
//! A plugin is a bundle of optional capabilities ([`Plugin`]): it may handle
//! metadata block markers, contribute template variables, exchange data with
//! other plugins before the run and generate pages of its own once every
//! document is done. [`PluginSet`] holds the plugins of a run in
//! registration order and drives them through their lifecycle.
//!
//! # Built-in plugins
//!
//! | Name | Marker | Contributes |
//! |---|---|---|
//! | `page-flows` | | Navigation through ordered page lists |
//! | `relative-paths` | configurable | Paths relative to the current page |
//! | `page-variables` | `VARIABLES` | Variables declared in the page |
//! | `variables` | | Static variables |
//! | `index` | `INDEX` | A generated index page |
//! | `page-links` | `PAGE` | Links to pages by document code |
//! | `include-file` | configurable | Content of other files |
//! | `replace` | configurable | Filled text templates |
//! | `ignore` | `IGNORE` | Blocks kept as HTML comments |
//! | `wrap-code` | configurable | Pages showing source files as code blocks |
//!
//! # Example
//!
//! ```
//! use md2html_plugins::PluginSet;
//! use serde_json::json;
//!
//! let config = json!({"variables": {"logo": "logo.png"}, "ignore": {}});
//! let set = PluginSet::from_config(config.as_object().unwrap()).unwrap();
//! assert_eq!(set.names(), ["variables", "ignore"]);
//! ```

pub mod builtin;
mod config;
mod error;
mod plugin;
mod replacer;
mod set;
mod state;
mod substring;

pub use error::PluginError;
pub use plugin::{
    FinalizeContext, HandlerInfo, OtherPlugins, PageContext, PageRecord, PageStatus, Plugin,
    PluginDataMap, PreInitContext,
};
pub use replacer::{Replacer, TemplateError};
pub use set::PluginSet;
pub use state::PluginState;
pub use substring::{DelimiterOverrides, Delimiters, Substringer};
