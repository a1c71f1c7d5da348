//! Metadata block processing for md2html.
//!
//! Pages embed metadata blocks written as HTML comments whose content starts
//! with an identifier, the *marker*:
//!
//! ```text
//! <!--VARIABLES {"title": "Getting started"}-->
//! <!--INCLUDE snippets/intro.md-->
//! ```
//!
//! This crate finds those blocks ([`scan`]), maps markers to handlers
//! ([`HandlerRegistry`]) and replaces each block with its handlers' output
//! ([`SubstitutionEngine`]). Nested substitution is guarded against cycles
//! by [`VisitedMarkers`].
//!
//! # Example
//!
//! ```
//! use md2html_metadata::{
//!     HandlerId, HandlerRegistry, HandlerSet, MetadataBlock, MetadataError, MetadataOutput,
//!     SubstitutionEngine, VisitedMarkers,
//! };
//!
//! struct Shout;
//!
//! impl HandlerSet for Shout {
//!     type Context<'c> = ();
//!
//!     fn accept_page_metadata(
//!         &mut self,
//!         _id: HandlerId,
//!         block: &MetadataBlock<'_>,
//!         _ctx: &(),
//!         _visited: &VisitedMarkers,
//!     ) -> Result<MetadataOutput, MetadataError> {
//!         Ok(MetadataOutput::text(block.metadata.trim().to_uppercase()))
//!     }
//! }
//!
//! let mut builder = HandlerRegistry::builder();
//! builder.register("shout", false, HandlerId(0));
//! let registry = builder.build();
//!
//! let output = SubstitutionEngine::new(&registry)
//!     .apply("Say <!--SHOUT hello-->!", &mut Shout, &(), &mut VisitedMarkers::new())
//!     .unwrap();
//! assert_eq!(output, "Say HELLO!");
//! ```

mod engine;
mod error;
mod registry;
mod scanner;
mod visited;

pub use engine::{HandlerSet, MetadataOutput, SubstitutionEngine};
pub use error::MetadataError;
pub use registry::{HandlerId, HandlerRegistry, HandlerRegistryBuilder};
pub use scanner::{END_TOKEN, MetadataBlock, MetadataBlocks, START_TOKEN, scan};
pub use visited::{MAX_RECURSION_DEPTH, VisitGuard, VisitedMarkers};
