//! Registry client: memoized, coalesced module contract resolution.

use std::sync::Arc;

use stackweave_common::error::StackError;
use stackweave_common::types::{ModuleDescriptor, ModuleIO, ModuleKey};
use thiserror::Error;

use crate::cache::ModuleCache;

/// Failure reported by a module registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The registry could not be reached or answered with a server error.
    #[error("registry unavailable: {0}")]
    Unavailable(String),
    /// The registry answered but has no such module.
    #[error("module not found in registry")]
    NotFound,
}

impl RegistryError {
    /// Converts into the workspace error, scoped to `component`.
    #[must_use]
    pub fn into_stack_error(self, component: &str, module: &ModuleKey) -> StackError {
        match self {
            Self::Unavailable(reason) => StackError::RegistryUnavailable {
                module: module.to_string(),
                reason,
            },
            Self::NotFound => StackError::MissingModuleDefinition {
                component: component.to_string(),
                module: module.to_string(),
            },
        }
    }
}

/// A source of module contracts.
///
/// Implementors perform the actual lookup; caching and coalescing are the
/// client's concern.
pub trait ModuleRegistry: Send + Sync {
    /// Fetches the input/output contract of `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Unavailable` if the source cannot be reached and
    /// `RegistryError::NotFound` if it has no such module.
    fn fetch(&self, descriptor: &ModuleDescriptor) -> Result<ModuleIO, RegistryError>;
}

/// Resolves module descriptors through a registry and an injected cache.
#[derive(Clone)]
pub struct RegistryClient {
    registry: Arc<dyn ModuleRegistry>,
    cache: ModuleCache,
}

impl RegistryClient {
    /// Creates a client over `registry` using `cache` for memoization.
    #[must_use]
    pub fn new(registry: Arc<dyn ModuleRegistry>, cache: ModuleCache) -> Self {
        Self { registry, cache }
    }

    /// Resolves the contract of `descriptor`, memoized by module identity.
    ///
    /// Concurrent resolutions of the same identity share one fetch.
    ///
    /// # Errors
    ///
    /// Returns the registry's error if the contract is not cached and the fetch fails.
    pub fn resolve(&self, descriptor: &ModuleDescriptor) -> Result<Arc<ModuleIO>, RegistryError> {
        let key = descriptor.key();
        self.cache
            .get_or_fetch(key.clone(), || {
                tracing::debug!(module = %key, "fetching module contract");
                self.registry.fetch(descriptor).map(Arc::new)
            })
            .map_err(|e| {
                tracing::warn!(module = %descriptor, error = %e, "module resolution failed");
                (*e).clone()
            })
    }

    /// Discards any cached contract for `descriptor` and fetches it again.
    ///
    /// # Errors
    ///
    /// Returns the registry's error if the fetch fails.
    pub fn refresh(&self, descriptor: &ModuleDescriptor) -> Result<Arc<ModuleIO>, RegistryError> {
        self.cache.invalidate(&descriptor.key());
        self.resolve(descriptor)
    }

    /// Returns the cache backing this client.
    #[must_use]
    pub const fn cache(&self) -> &ModuleCache {
        &self.cache
    }
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
