//! Loads stack manifests and resolves their dependency graph.
//!
//! Wraps `stackweave-compose`'s graph builder into a high-level API for
//! SDK consumers.

use std::path::Path;

use stackweave_common::error::Result;
use stackweave_common::manifest::StackManifest;
use stackweave_common::types::Component;
use stackweave_compose::graph::{self, BuildFailure, DependencyEdge, DependencyGraph};

/// High-level resolver for component dependency graphs.
#[derive(Debug, Default)]
pub struct GraphResolver {
    graph: DependencyGraph,
    failures: Vec<BuildFailure>,
}

impl GraphResolver {
    /// Creates a new empty graph resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph of `components`, replacing any previous one.
    pub fn load_components(&mut self, components: Vec<Component>) {
        let build = graph::build(components);
        self.graph = build.graph;
        self.failures = build.failures;
        self.failures
            .extend(build.duplicates.into_iter().map(|d| d.failure));
    }

    /// Loads a JSON or YAML stack manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read or parsed.
    pub fn load_manifest(&mut self, path: &Path) -> Result<()> {
        tracing::info!(path = %path.display(), "loading stack manifest");
        let manifest = StackManifest::load(path)?;
        self.load_components(manifest.components);
        Ok(())
    }

    /// The resolved graph.
    #[must_use]
    pub const fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Declaration failures of the last load, duplicate declarations last.
    #[must_use]
    pub fn failures(&self) -> &[BuildFailure] {
        &self.failures
    }

    /// Dependency edges in discovery order.
    #[must_use]
    pub fn edges(&self) -> &[DependencyEdge] {
        self.graph.edges()
    }

    /// Returns the deployment order for all components.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
    pub fn deployment_order(&self) -> Result<Vec<String>> {
        self.graph.deployment_order()
    }
}
