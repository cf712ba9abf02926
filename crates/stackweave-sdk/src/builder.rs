//! Fluent API for configuring a [`StackComposer`].

use std::path::PathBuf;
use std::sync::Arc;

use stackweave_common::config::StackConfig;
use stackweave_common::error::Result;
use stackweave_compose::generator::ConfigGenerator;
use stackweave_registry::catalog::{OfflineRegistry, StaticRegistry};
use stackweave_registry::http::HttpRegistry;
use stackweave_registry::{ModuleCache, ModuleRegistry, RegistryClient};

use crate::composer::StackComposer;

/// Builder for a [`StackComposer`].
///
/// The module registry is chosen in this order: an explicit registry, a
/// local catalog file, offline mode, then the configured remote registry.
#[derive(Default)]
pub struct StackComposerBuilder {
    config: StackConfig,
    registry: Option<Arc<dyn ModuleRegistry>>,
    catalog: Option<PathBuf>,
    offline: bool,
    workers: Option<usize>,
}

impl std::fmt::Debug for StackComposerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackComposerBuilder")
            .field("config", &self.config)
            .field("catalog", &self.catalog)
            .field("offline", &self.offline)
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

impl StackComposerBuilder {
    /// Creates a builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn config(mut self, config: StackConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses `registry` as the module source.
    #[must_use]
    pub fn registry(mut self, registry: Arc<dyn ModuleRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Loads module contracts from a local catalog file.
    #[must_use]
    pub fn catalog(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog = Some(path.into());
        self
    }

    /// Disables remote registry access.
    #[must_use]
    pub const fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Overrides the configured worker count.
    #[must_use]
    pub const fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Builds the registry client alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded or the HTTP client
    /// cannot be constructed.
    pub fn registry_client(&self) -> Result<RegistryClient> {
        let registry: Arc<dyn ModuleRegistry> = if let Some(registry) = &self.registry {
            Arc::clone(registry)
        } else if let Some(path) = &self.catalog {
            let catalog = StaticRegistry::load(path)?;
            tracing::info!(path = %path.display(), modules = catalog.len(), "loaded module catalog");
            Arc::new(catalog)
        } else if self.offline {
            tracing::info!("offline mode: module contracts unavailable");
            Arc::new(OfflineRegistry)
        } else {
            Arc::new(HttpRegistry::new(&self.config.registry)?)
        };
        Ok(RegistryClient::new(registry, ModuleCache::from_config(&self.config.registry)))
    }

    /// Builds the composer.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the registry
    /// cannot be set up.
    pub fn build(self) -> Result<StackComposer> {
        self.config.validate()?;
        let client = self.registry_client()?;
        let workers = self.workers.unwrap_or(self.config.batch.workers);
        let generator = ConfigGenerator::from_config(client, &self.config);
        Ok(StackComposer::new(generator, workers))
    }
}
