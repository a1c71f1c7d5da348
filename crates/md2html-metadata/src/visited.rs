//! Recursion guard for nested substitutions.

use std::ops::{Deref, DerefMut};

use crate::MetadataError;

/// Maximum number of nested recursion tokens.
///
/// Entering one more token than this fails with
/// [`MetadataError::SuspectedCycle`] even when no token repeats.
pub const MAX_RECURSION_DEPTH: usize = 100;

/// Ordered set of the recursion tokens currently on the call stack.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VisitedMarkers {
    chain: Vec<String>,
}

impl VisitedMarkers {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `token` is on the stack.
    pub fn contains(&self, token: &str) -> bool {
        self.chain.iter().any(|t| t == token)
    }

    /// Number of tokens on the stack.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Tokens in the order they were entered.
    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    /// Push `token` for the lifetime of the returned guard.
    ///
    /// The token is popped when the guard is dropped, so a failed nested
    /// substitution still releases it.
    pub fn enter(&mut self, token: &str) -> Result<VisitGuard<'_>, MetadataError> {
        if self.contains(token) {
            return Err(MetadataError::Cycle {
                token: token.to_owned(),
                chain: self.chain.clone(),
            });
        }
        if self.chain.len() >= MAX_RECURSION_DEPTH {
            return Err(MetadataError::SuspectedCycle {
                token: token.to_owned(),
                chain: self.chain.clone(),
            });
        }

        tracing::trace!(token, depth = self.chain.len() + 1, "entering recursion token");
        self.chain.push(token.to_owned());
        Ok(VisitGuard { visited: self })
    }
}

/// Scope guard returned by [`VisitedMarkers::enter`].
///
/// Dereferences to the guarded set so nested calls can keep entering tokens.
#[derive(Debug)]
pub struct VisitGuard<'a> {
    visited: &'a mut VisitedMarkers,
}

impl Deref for VisitGuard<'_> {
    type Target = VisitedMarkers;

    fn deref(&self) -> &VisitedMarkers {
        self.visited
    }
}

impl DerefMut for VisitGuard<'_> {
    fn deref_mut(&mut self) -> &mut VisitedMarkers {
        self.visited
    }
}

impl Drop for VisitGuard<'_> {
    fn drop(&mut self) {
        self.visited.chain.pop();
    }
}
