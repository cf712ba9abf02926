//! Local module sources.
//!
//! [`StaticRegistry`] serves contracts from an in-memory catalog, optionally
//! loaded from a JSON or YAML file. [`OfflineRegistry`] refuses every lookup,
//! which drives callers into declared-only generation.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stackweave_common::error::Result;
use stackweave_common::manifest::load_document;
use stackweave_common::types::{ModuleDescriptor, ModuleIO, ModuleKey, VariableDefinition};

use crate::client::{ModuleRegistry, RegistryError};

/// One module in a catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Module identity.
    pub module: ModuleDescriptor,
    /// Declared inputs.
    #[serde(default)]
    pub inputs: Vec<VariableDefinition>,
    /// Declared outputs.
    #[serde(default)]
    pub outputs: Vec<VariableDefinition>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    modules: Vec<CatalogEntry>,
}

/// An in-memory registry.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    modules: HashMap<ModuleKey, ModuleIO>,
}

impl StaticRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a module contract.
    #[must_use]
    pub fn with_module(mut self, descriptor: &ModuleDescriptor, io: ModuleIO) -> Self {
        let _ = self.modules.insert(descriptor.key(), io);
        self
    }

    /// Builds a registry from catalog entries. Later entries replace earlier ones.
    #[must_use]
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        let modules = entries
            .into_iter()
            .map(|e| (e.module.key(), ModuleIO::from_lists(e.inputs, e.outputs)))
            .collect();
        Self { modules }
    }

    /// Loads a `{ modules: [...] }` catalog from a JSON or YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn load(path: &Path) -> Result<Self> {
        let file: CatalogFile = load_document(path)?;
        tracing::info!(path = %path.display(), modules = file.modules.len(), "loaded module catalog");
        Ok(Self::from_entries(file.modules))
    }

    /// Number of modules in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleRegistry for StaticRegistry {
    fn fetch(&self, descriptor: &ModuleDescriptor) -> std::result::Result<ModuleIO, RegistryError> {
        self.modules
            .get(&descriptor.key())
            .cloned()
            .ok_or(RegistryError::NotFound)
    }
}

/// A registry that is never reachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRegistry;

impl ModuleRegistry for OfflineRegistry {
    fn fetch(&self, _descriptor: &ModuleDescriptor) -> std::result::Result<ModuleIO, RegistryError> {
        Err(RegistryError::Unavailable("offline mode".into()))
    }
}

#[cfg(test)]
mod tests {
    use stackweave_common::types::TypeTag;

    use super::*;

    #[test]
    fn static_registry_serves_known_modules() {
        let vpc = ModuleDescriptor::new("terraform-aws-modules", "vpc", "aws");
        let registry = StaticRegistry::new().with_module(
            &vpc,
            ModuleIO::from_lists(
                vec![],
                vec![VariableDefinition::new("vpc_id", TypeTag::String, "The ID of the VPC")],
            ),
        );
        let io = registry.fetch(&vpc).expect("fetch");
        assert!(io.outputs.contains_key("vpc_id"));
        let other = ModuleDescriptor::new("terraform-aws-modules", "rds", "aws");
        assert_eq!(registry.fetch(&other).unwrap_err(), RegistryError::NotFound);
    }

    #[test]
    fn offline_registry_is_unavailable() {
        let err = OfflineRegistry
            .fetch(&ModuleDescriptor::new("a", "b", "c"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Unavailable(_)));
    }

    #[test]
    fn loads_catalog_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"{"modules": [{
                "module": {"namespace": "terraform-aws-modules", "name": "security-group", "provider": "aws"},
                "inputs": [{"name": "vpc_id", "type": "string", "description": "ID of the VPC", "required": true}],
                "outputs": [{"name": "security_group_id", "type": "string", "description": "The ID of the security group"}]
            }]}"#,
        )
        .expect("write");
        let registry = StaticRegistry::load(&path).expect("load");
        assert_eq!(registry.len(), 1);
        let io = registry
            .fetch(&ModuleDescriptor::new("terraform-aws-modules", "security-group", "aws"))
            .expect("fetch");
        assert!(io.inputs["vpc_id"].required);
    }
}
