//! Substitution engine.
//!
//! Replaces every metadata block that has registered handlers with the
//! output of the last handler in its chain. Handlers that want their output
//! substituted again return [`MetadataOutput::Recurse`] and the engine runs
//! itself on that output under a recursion token.

use crate::registry::{HandlerId, HandlerRegistry};
use crate::scanner::{MetadataBlock, scan};
use crate::visited::VisitedMarkers;
use crate::MetadataError;

/// Output of a single handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataOutput {
    /// Final replacement text.
    Text(String),
    /// Replacement text that must itself be substituted.
    Recurse {
        /// Text to substitute.
        text: String,
        /// Token identifying this recursive context for cycle detection.
        token: String,
    },
}

impl MetadataOutput {
    /// Create a final replacement.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a replacement that is substituted again under `token`.
    pub fn recurse(text: impl Into<String>, token: impl Into<String>) -> Self {
        Self::Recurse {
            text: text.into(),
            token: token.into(),
        }
    }
}

/// The owner of the handlers that a [`HandlerRegistry`] refers to.
pub trait HandlerSet {
    /// Per-call context handed through to every handler (the page being
    /// processed, shared services).
    type Context<'c>: ?Sized;

    /// Invoke handler `id` on `block`.
    fn accept_page_metadata(
        &mut self,
        id: HandlerId,
        block: &MetadataBlock<'_>,
        ctx: &Self::Context<'_>,
        visited: &VisitedMarkers,
    ) -> Result<MetadataOutput, MetadataError>;
}

/// Applies registered handlers to page text.
#[derive(Debug, Clone, Copy)]
pub struct SubstitutionEngine<'r> {
    registry: &'r HandlerRegistry,
}

impl<'r> SubstitutionEngine<'r> {
    /// Create an engine over `registry`.
    #[must_use]
    pub fn new(registry: &'r HandlerRegistry) -> Self {
        Self { registry }
    }

    /// Substitute the metadata blocks of `text`.
    ///
    /// Text without blocks that have handlers is returned unchanged.
    pub fn apply<H>(
        &self,
        text: &str,
        handlers: &mut H,
        ctx: &H::Context<'_>,
        visited: &mut VisitedMarkers,
    ) -> Result<String, MetadataError>
    where
        H: HandlerSet + ?Sized,
    {
        let mut output = String::with_capacity(text.len());
        let mut last_end = 0;

        for block in scan(text) {
            let at_start = block.before.trim().is_empty();
            output.push_str(block.before);
            last_end = block.end_position;

            match self.registry.lookup(block.marker, at_start) {
                Some(ids) => {
                    let replacement = self.run_chain(ids, &block, handlers, ctx, visited)?;
                    output.push_str(&replacement);
                }
                None => output.push_str(block.metadata_block),
            }

            if self.registry.all_start_only() {
                break;
            }
        }

        output.push_str(&text[last_end..]);
        Ok(output)
    }

    /// Substitute `text` with `token` pushed onto `visited`.
    ///
    /// Fails when `token` is already on the stack or the stack is at the
    /// depth bound. The token is popped again whatever the outcome.
    pub fn apply_recursive<H>(
        &self,
        text: &str,
        handlers: &mut H,
        ctx: &H::Context<'_>,
        visited: &mut VisitedMarkers,
        token: &str,
    ) -> Result<String, MetadataError>
    where
        H: HandlerSet + ?Sized,
    {
        let mut guard = visited.enter(token)?;
        self.apply(text, handlers, ctx, &mut guard)
    }

    fn run_chain<H>(
        &self,
        ids: &[HandlerId],
        block: &MetadataBlock<'_>,
        handlers: &mut H,
        ctx: &H::Context<'_>,
        visited: &mut VisitedMarkers,
    ) -> Result<String, MetadataError>
    where
        H: HandlerSet + ?Sized,
    {
        // Every handler runs for its side effects; only the last output counts.
        let mut kept = None;
        for &id in ids {
            kept = Some(handlers.accept_page_metadata(id, block, ctx, visited)?);
        }

        match kept {
            Some(MetadataOutput::Text(text)) => Ok(text),
            Some(MetadataOutput::Recurse { text, token }) => {
                self.apply_recursive(&text, handlers, ctx, visited, &token)
            }
            None => Ok(block.metadata_block.to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::MAX_RECURSION_DEPTH;

    type Handler = Box<dyn FnMut(&MetadataBlock<'_>, &VisitedMarkers) -> MetadataOutput>;

    /// Handlers backed by closures, recording every invocation.
    #[derive(Default)]
    struct TestHandlers {
        handlers: Vec<Handler>,
        calls: Vec<(usize, String, String)>,
    }

    impl TestHandlers {
        fn add(
            &mut self,
            handler: impl FnMut(&MetadataBlock<'_>, &VisitedMarkers) -> MetadataOutput + 'static,
        ) -> HandlerId {
            self.handlers.push(Box::new(handler));
            HandlerId(self.handlers.len() - 1)
        }
    }

    impl HandlerSet for TestHandlers {
        type Context<'c> = str;

        fn accept_page_metadata(
            &mut self,
            id: HandlerId,
            block: &MetadataBlock<'_>,
            _ctx: &str,
            visited: &VisitedMarkers,
        ) -> Result<MetadataOutput, MetadataError> {
            self.calls
                .push((id.0, block.marker.to_owned(), block.metadata.to_owned()));
            let handler = &mut self.handlers[id.0];
            Ok(handler(block, visited))
        }
    }

    fn registry(entries: &[(&str, bool, HandlerId)]) -> HandlerRegistry {
        let mut builder = HandlerRegistry::builder();
        for &(marker, start_only, id) in entries {
            builder.register(marker, start_only, id);
        }
        builder.build()
    }

    fn apply(registry: &HandlerRegistry, handlers: &mut TestHandlers, text: &str) -> String {
        SubstitutionEngine::new(registry)
            .apply(text, handlers, "page.md", &mut VisitedMarkers::new())
            .unwrap()
    }

    #[test]
    fn test_identity_without_matching_markers() {
        let mut handlers = TestHandlers::default();
        let id = handlers.add(|_, _| MetadataOutput::text("X"));
        let registry = registry(&[("KNOWN", false, id)]);

        let texts = [
            "plain text",
            "<!--UNKNOWN payload--> and <!-- comment -->",
            "stray --> and <!--open",
        ];
        for text in texts {
            assert_eq!(apply(&registry, &mut handlers, text), text);
        }
        assert!(handlers.calls.is_empty());
    }

    #[test]
    fn test_replaces_blocks_and_keeps_surrounding_text() {
        let mut handlers = TestHandlers::default();
        let id = handlers.add(|block, _| MetadataOutput::text(block.metadata.trim().to_uppercase()));
        let registry = registry(&[("up", false, id)]);

        let output = apply(&registry, &mut handlers, "a <!--UP one--> b <!--up two--> c");

        assert_eq!(output, "a ONE b TWO c");
    }

    #[test]
    fn test_last_handler_output_wins() {
        let mut handlers = TestHandlers::default();
        let first = handlers.add(|_, _| MetadataOutput::text("first"));
        let second = handlers.add(|_, _| MetadataOutput::text("second"));
        let registry = registry(&[("M", false, first), ("m", false, second)]);

        let output = apply(&registry, &mut handlers, "<!--M payload-->");

        assert_eq!(output, "second");
        assert_eq!(
            handlers.calls,
            vec![
                (0, "M".to_owned(), " payload".to_owned()),
                (1, "M".to_owned(), " payload".to_owned()),
            ]
        );
    }

    #[test]
    fn test_start_only_handler_skips_later_blocks() {
        let mut handlers = TestHandlers::default();
        let vars = handlers.add(|_, _| MetadataOutput::text(""));
        let other = handlers.add(|block, _| MetadataOutput::text(format!("[{}]", block.marker)));
        let registry = registry(&[("VARIABLES", true, vars), ("LINK", false, other)]);

        let output = apply(
            &registry,
            &mut handlers,
            "  <!--VARIABLES {}-->text<!--VARIABLES {}--><!--LINK x-->",
        );

        assert_eq!(output, "  text<!--VARIABLES {}-->[LINK]");
    }

    #[test]
    fn test_consecutive_start_blocks_are_all_at_start() {
        let mut handlers = TestHandlers::default();
        let vars = handlers.add(|block, _| {
            MetadataOutput::text(format!("[{}]", block.metadata.trim()))
        });
        let other = handlers.add(|block, _| MetadataOutput::text(format!("[{}]", block.marker)));
        let registry = registry(&[("VARIABLES", true, vars), ("LINK", false, other)]);

        let output = apply(
            &registry,
            &mut handlers,
            "<!--VARIABLES {\"a\":1}-->\n<!--VARIABLES {\"b\":2}-->\ntext <!--VARIABLES {}-->",
        );

        assert_eq!(output, "[{\"a\":1}]\n[{\"b\":2}]\ntext <!--VARIABLES {}-->");
    }

    #[test]
    fn test_all_start_only_short_circuit() {
        let mut handlers = TestHandlers::default();
        let index = handlers.add(|_, _| MetadataOutput::text(""));
        let registry = registry(&[("INDEX", true, index)]);

        let text = "<!--INDEX {\"k\":1}-->rest<!--INDEX {\"k\":2}-->";
        let output = apply(&registry, &mut handlers, text);

        assert_eq!(output, "rest<!--INDEX {\"k\":2}-->");
        assert_eq!(handlers.calls.len(), 1);
        assert_eq!(handlers.calls[0].2.trim(), "{\"k\":1}");
    }

    #[test]
    fn test_short_circuit_applies_even_without_handler_match() {
        let mut handlers = TestHandlers::default();
        let vars = handlers.add(|_, _| MetadataOutput::text(""));
        let registry = registry(&[("VARIABLES", true, vars)]);

        let text = "intro <!--VARIABLES {}--> <!--VARIABLES {}-->";
        assert_eq!(apply(&registry, &mut handlers, text), text);
        assert!(handlers.calls.is_empty());
    }

    #[test]
    fn test_recursive_output_is_substituted() {
        let mut handlers = TestHandlers::default();
        let include = handlers.add(|block, _| match block.metadata.trim() {
            "outer" => MetadataOutput::recurse("<<!--INC inner-->>", "inc:outer"),
            name => MetadataOutput::text(name.to_owned()),
        });
        let registry = registry(&[("INC", false, include)]);

        let output = apply(&registry, &mut handlers, "<!--INC outer-->");

        assert_eq!(output, "<inner>");
    }

    #[test]
    fn test_handler_sees_visited_chain() {
        let mut handlers = TestHandlers::default();
        let include = handlers.add(|block, visited| match block.metadata.trim() {
            "outer" => MetadataOutput::recurse("<!--INC inner-->", "inc:outer"),
            _ => MetadataOutput::text(visited.chain().join(",")),
        });
        let registry = registry(&[("INC", false, include)]);

        assert_eq!(apply(&registry, &mut handlers, "<!--INC outer-->"), "inc:outer");
    }

    #[test]
    fn test_repeated_token_is_cycle() {
        let mut handlers = TestHandlers::default();
        let include = handlers.add(|_, _| MetadataOutput::recurse("<!--INC self-->", "inc:self"));
        let registry = registry(&[("INC", false, include)]);

        let err = SubstitutionEngine::new(&registry)
            .apply(
                "<!--INC self-->",
                &mut handlers,
                "page.md",
                &mut VisitedMarkers::new(),
            )
            .unwrap_err();

        match err {
            MetadataError::Cycle { token, chain } => {
                assert_eq!(token, "inc:self");
                assert_eq!(chain, vec!["inc:self".to_owned()]);
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    /// Handler that recurses through `limit` distinct tokens and then stops.
    fn chain_handlers(limit: usize) -> (TestHandlers, HandlerRegistry) {
        let mut handlers = TestHandlers::default();
        let id = handlers.add(move |block, _| {
            let level: usize = block.metadata.trim().parse().unwrap();
            if level == limit {
                MetadataOutput::text("bottom")
            } else {
                MetadataOutput::recurse(
                    format!("<!--DEEP {}-->", level + 1),
                    format!("deep:{level}"),
                )
            }
        });
        let registry = registry(&[("DEEP", false, id)]);
        (handlers, registry)
    }

    #[test]
    fn test_distinct_tokens_up_to_depth_bound_succeed() {
        let (mut handlers, registry) = chain_handlers(MAX_RECURSION_DEPTH);
        let mut visited = VisitedMarkers::new();

        let output = SubstitutionEngine::new(&registry)
            .apply("<!--DEEP 0-->", &mut handlers, "page.md", &mut visited)
            .unwrap();

        assert_eq!(output, "bottom");
        assert!(visited.is_empty());
    }

    #[test]
    fn test_one_past_depth_bound_is_suspected_cycle() {
        let (mut handlers, registry) = chain_handlers(MAX_RECURSION_DEPTH + 1);
        let mut visited = VisitedMarkers::new();

        let err = SubstitutionEngine::new(&registry)
            .apply("<!--DEEP 0-->", &mut handlers, "page.md", &mut visited)
            .unwrap_err();

        match err {
            MetadataError::SuspectedCycle { token, chain } => {
                assert_eq!(token, format!("deep:{MAX_RECURSION_DEPTH}"));
                assert_eq!(chain.len(), MAX_RECURSION_DEPTH);
            }
            other => panic!("expected suspected cycle, got {other:?}"),
        }
        assert!(visited.is_empty(), "guard must release tokens on failure");
    }

    #[test]
    fn test_sibling_recursions_reuse_token() {
        let mut handlers = TestHandlers::default();
        let include = handlers.add(|block, _| match block.metadata.trim() {
            "shared" => MetadataOutput::recurse("S", "inc:shared"),
            _ => MetadataOutput::text("?"),
        });
        let registry = registry(&[("INC", false, include)]);

        let output = apply(&registry, &mut handlers, "<!--INC shared--><!--INC shared-->");

        assert_eq!(output, "SS");
    }

    #[test]
    fn test_handler_error_propagates() {
        struct Failing;

        impl HandlerSet for Failing {
            type Context<'c> = ();

            fn accept_page_metadata(
                &mut self,
                _id: HandlerId,
                block: &MetadataBlock<'_>,
                _ctx: &(),
                _visited: &VisitedMarkers,
            ) -> Result<MetadataOutput, MetadataError> {
                Err(MetadataError::content(format!("bad {}", block.marker)))
            }
        }

        let registry = registry(&[("X", false, HandlerId(0))]);
        let err = SubstitutionEngine::new(&registry)
            .apply("<!--X-->", &mut Failing, &(), &mut VisitedMarkers::new())
            .unwrap_err();

        assert_eq!(err.to_string(), "bad X");
    }

    #[test]
    fn test_handlers_by_marker_table() {
        // Replacement per marker mirrors a typical configured page.
        let replacements: HashMap<&str, &str> =
            [("TITLE", "Guide"), ("VERSION", "1.2")].into_iter().collect();
        let mut handlers = TestHandlers::default();
        let id = handlers.add(move |block, _| {
            MetadataOutput::text(replacements[block.marker.to_uppercase().as_str()])
        });
        let registry = registry(&[("TITLE", false, id), ("VERSION", false, id)]);

        let output = apply(
            &registry,
            &mut handlers,
            "# <!--title--> v<!--version-->\n",
        );

        assert_eq!(output, "# Guide v1.2\n");
    }
}
