//! Substitution errors.

/// Error raised while substituting metadata blocks.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// A recursion token was entered while already on the stack.
    #[error("Cycle detected at recursion token '{token}', chain: {}", format_chain(.chain, .token))]
    Cycle {
        /// Token that repeated.
        token: String,
        /// Tokens on the stack when the repeat was detected.
        chain: Vec<String>,
    },
    /// Nesting went past the depth bound without an exact repeat.
    #[error(
        "Suspected cycle: recursion depth limit ({limit}) exceeded at token '{token}', chain: {}",
        format_chain(.chain, .token),
        limit = crate::MAX_RECURSION_DEPTH
    )]
    SuspectedCycle {
        /// Token that would have exceeded the bound.
        token: String,
        /// Tokens on the stack at that point.
        chain: Vec<String>,
    },
    /// A handler rejected the block content.
    #[error("{0}")]
    Content(String),
}

impl MetadataError {
    /// Build a [`MetadataError::Content`] error.
    pub fn content(message: impl Into<String>) -> Self {
        Self::Content(message.into())
    }
}

fn format_chain(chain: &[String], token: &str) -> String {
    let mut parts: Vec<&str> = chain.iter().map(String::as_str).collect();
    parts.push(token);
    parts.join(" -> ")
}
