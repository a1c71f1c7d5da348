//! Handler registry keyed by marker and start-only flag.

use std::collections::HashMap;

/// Identifier of a handler within a [`HandlerSet`](crate::HandlerSet).
///
/// The registry only stores ids; the handler set that owns the handlers
/// decides what an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub usize);

/// Registry key: uppercased marker plus the start-only flag.
type MarkerKey = (String, bool);

/// Immutable lookup table from markers to ordered handler chains.
///
/// Built once through [`HandlerRegistryBuilder`] after all plugins are
/// configured.
#[derive(Debug, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<MarkerKey, Vec<HandlerId>>,
    all_start_only: bool,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl HandlerRegistry {
    /// Start building a registry.
    #[must_use]
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    /// Find the handler chain for a block.
    ///
    /// Markers match case-insensitively. A block at the start of the page
    /// prefers start-only handlers and falls back to the general ones; any
    /// other block only sees the general handlers.
    pub fn lookup(&self, marker: &str, at_start: bool) -> Option<&[HandlerId]> {
        let marker = marker.to_uppercase();
        if at_start && let Some(ids) = self.handlers.get(&(marker.clone(), true)) {
            return Some(ids);
        }
        self.handlers.get(&(marker, false)).map(Vec::as_slice)
    }

    /// Whether every registered handler is start-only.
    ///
    /// True for an empty registry.
    pub fn all_start_only(&self) -> bool {
        self.all_start_only
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Builder for [`HandlerRegistry`].
#[derive(Debug)]
pub struct HandlerRegistryBuilder {
    handlers: HashMap<MarkerKey, Vec<HandlerId>>,
    all_start_only: bool,
}

impl Default for HandlerRegistryBuilder {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
            all_start_only: true,
        }
    }
}

impl HandlerRegistryBuilder {
    /// Append a handler to the chain of `marker`.
    pub fn register(&mut self, marker: &str, start_only: bool, id: HandlerId) -> &mut Self {
        if !start_only {
            self.all_start_only = false;
        }
        self.handlers
            .entry((marker.to_uppercase(), start_only))
            .or_default()
            .push(id);
        self
    }

    /// Freeze the registry.
    #[must_use]
    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            handlers: self.handlers,
            all_start_only: self.all_start_only,
        }
    }
}
