//! Backend registry keyed by selector.
//!
//! A selector is the literal `file` for file URIs and the authority segment
//! (`host[:port]`) for every other scheme.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::ops::StorageBackend;
use crate::error::{RestError, RestResult};

/// Information about a registered backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendInfo {
    /// Selector the backend answers to (e.g., "file", "mem").
    pub selector: String,
    /// Backend display name.
    pub name: String,
}

/// Maps selectors to backends.
///
/// Built once before the dispatcher and never mutated while serving, so
/// lookups need no locking.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: BTreeMap<String, Arc<dyn StorageBackend>>,
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("selectors", &self.backends.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl BackendRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend under `selector`.
    ///
    /// A backend already registered under the same selector is replaced.
    pub fn register(&mut self, selector: impl Into<String>, backend: impl StorageBackend + 'static) {
        self.backends.insert(selector.into(), Arc::new(backend));
    }

    /// Register a backend (already wrapped in Arc) under `selector`.
    pub fn register_arc(&mut self, selector: impl Into<String>, backend: Arc<dyn StorageBackend>) {
        self.backends.insert(selector.into(), backend);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_backend(
        mut self,
        selector: impl Into<String>,
        backend: impl StorageBackend + 'static,
    ) -> Self {
        self.register(selector, backend);
        self
    }

    /// Returns true if a backend answers to `selector`.
    pub fn contains(&self, selector: &str) -> bool {
        self.backends.contains_key(selector)
    }

    /// Resolve the backend for `selector`.
    ///
    /// An unknown selector means the caller wired the system incorrectly,
    /// so this is an error rather than a response.
    pub fn resolve(&self, selector: &str) -> RestResult<Arc<dyn StorageBackend>> {
        self.backends
            .get(selector)
            .cloned()
            .ok_or_else(|| RestError::unknown_backend(selector))
    }

    /// List all registered backends.
    pub fn list(&self) -> Vec<BackendInfo> {
        self.backends
            .iter()
            .map(|(selector, backend)| BackendInfo {
                selector: selector.clone(),
                name: backend.name().to_string(),
            })
            .collect()
    }

    /// Number of registered backends.
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
