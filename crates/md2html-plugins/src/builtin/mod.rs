//! Built-in plugins, created by name from the argument file.

mod ignore;
mod include_file;
mod index;
mod page_flows;
mod page_links;
mod page_variables;
mod relative_paths;
mod replace;
mod variables;
mod wrap_code;

pub use ignore::IgnorePlugin;
pub use include_file::IncludeFilePlugin;
pub use index::IndexPlugin;
pub use page_flows::PageFlowsPlugin;
pub use page_links::PageLinksPlugin;
pub use page_variables::PageVariablesPlugin;
pub use relative_paths::RelativePathsPlugin;
pub use replace::ReplacePlugin;
pub use variables::VariablesPlugin;
pub use wrap_code::WrapCodePlugin;

use crate::Plugin;

/// Names the built-in plugins are configured under.
pub const PLUGIN_NAMES: &[&str] = &[
    page_flows::NAME,
    relative_paths::NAME,
    page_variables::NAME,
    variables::NAME,
    index::NAME,
    page_links::NAME,
    include_file::NAME,
    replace::NAME,
    ignore::NAME,
    wrap_code::NAME,
];

/// Create an unconfigured plugin by name.
pub fn create(name: &str) -> Option<Box<dyn Plugin>> {
    let plugin: Box<dyn Plugin> = match name {
        page_flows::NAME => Box::new(PageFlowsPlugin::new()),
        relative_paths::NAME => Box::new(RelativePathsPlugin::new()),
        page_variables::NAME => Box::new(PageVariablesPlugin::new()),
        variables::NAME => Box::new(VariablesPlugin::new()),
        index::NAME => Box::new(IndexPlugin::new()),
        page_links::NAME => Box::new(PageLinksPlugin::new()),
        include_file::NAME => Box::new(IncludeFilePlugin::new()),
        replace::NAME => Box::new(ReplacePlugin::new()),
        ignore::NAME => Box::new(IgnorePlugin::new()),
        wrap_code::NAME => Box::new(WrapCodePlugin::new()),
        _ => return None,
    };
    Some(plugin)
}
