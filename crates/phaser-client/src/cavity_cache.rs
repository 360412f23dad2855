//! Shared list of cavity names known to the server.

use std::sync::{Arc, RwLock};

use indexmap::IndexSet;

/// Thread-safe, cheaply cloneable holder of the server's cavity names.
///
/// Clones share the same contents. Readers always receive a snapshot, so a
/// refresh never changes a list someone is already iterating.
#[derive(Debug, Clone, Default)]
pub struct CavityCache {
    cavities: Arc<RwLock<IndexSet<String>>>,
}

impl CavityCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cached names.
    pub fn replace(&self, cavities: IndexSet<String>) {
        *self
            .cavities
            .write()
            .unwrap_or_else(|poison| poison.into_inner()) = cavities;
    }

    /// Copy of the cached names, in server order.
    #[must_use]
    pub fn snapshot(&self) -> IndexSet<String> {
        self.cavities
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    /// Whether `name` is a known cavity.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.cavities
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .contains(name)
    }

    /// Number of cached names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cavities
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .len()
    }

    /// Whether the cache holds no names.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
