//! Page rendering for md2html.
//!
//! Converts substituted page text to HTML ([`CommonMarkConverter`]), renders
//! it through a page template ([`TemplateRenderer`]) and writes the result
//! ([`PageWriter`]). Helpers for links relative to a generated page live in
//! [`relativize_resource`] and [`relativize_resource_path`].
//!
//! # Template variables
//!
//! | Variable | Value |
//! |---|---|
//! | `title` | Document title, overridable by plugins |
//! | `content` | Page HTML |
//! | `styles` | `<link>` and `<style>` elements |
//! | `exec_name`, `exec_version` | Generator name and version |
//! | `generation_date`, `generation_time` | Local time of generation |
//!
//! Plugins add their own variables on top.

mod error;
mod markdown;
mod relative;
mod styles;
mod template;
mod writer;

pub use error::RenderError;
pub use markdown::{CommonMarkConverter, MarkdownConverter};
pub use relative::{relativize_resource, relativize_resource_path};
pub use styles::document_styles;
pub use template::{
    DEFAULT_CSS, DEFAULT_TEMPLATE, DEFAULT_TEMPLATE_NAME, SAFE_VARIABLES, TemplateRenderer,
    Variables,
};
pub use writer::{EXEC_NAME, EXEC_VERSION, PageWriter};
