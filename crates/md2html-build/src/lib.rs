//! Build runs for md2html.
//!
//! A run goes through three stages:
//!
//! 1. [`Runner::new`] configures the plugins of a [`RunConfig`] and builds
//!    the marker registry.
//! 2. Every document is [`process`]ed in order: skipped when the
//!    [`IncrementalBuildGate`] finds its output up to date, otherwise read,
//!    substituted, converted to HTML, rendered and written.
//! 3. [`finalize_all`] lets plugins generate pages of their own, such as an
//!    index.
//!
//! # Example
//!
//! ```no_run
//! use md2html_build::{Runner, Services};
//! use md2html_cache::FileContentCache;
//! use md2html_config::{CliSettings, RunConfig};
//! use md2html_render::CommonMarkConverter;
//!
//! let config = RunConfig::load(Some("md2html.json".as_ref()), &CliSettings::default())?;
//! let cache = FileContentCache::new();
//! let converter = CommonMarkConverter::new();
//! let pages = Runner::new(config)?.run(&Services::new(&cache, &converter), |_| {})?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! [`RunConfig`]: md2html_config::RunConfig

mod error;
mod gate;
mod pipeline;
mod runner;

pub use error::{BuildError, PageError};
pub use gate::IncrementalBuildGate;
pub use pipeline::{Services, finalize_all, process};
pub use runner::Runner;
