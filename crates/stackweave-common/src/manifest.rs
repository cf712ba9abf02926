//! Loading of pre-parsed stack manifests and change sets.
//!
//! Both are plain serializations of the domain records in [`crate::types`],
//! accepted as JSON or YAML depending on the file extension.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StackError};
use crate::types::{ChangeSet, Component};

/// A stack: the component declarations produced by an external reader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackManifest {
    /// Component declarations, in declaration order.
    #[serde(default)]
    pub components: Vec<Component>,
}

impl StackManifest {
    /// Loads a manifest from a `.json`, `.yaml`, or `.yml` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn load(path: &Path) -> Result<Self> {
        load_document(path)
    }
}

impl ChangeSet {
    /// Loads a change set from a `.json`, `.yaml`, or `.yml` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn load(path: &Path) -> Result<Self> {
        load_document(path)
    }
}

/// Reads and decodes a JSON or YAML document.
///
/// # Errors
///
/// Returns an error if the file cannot be read, has an unsupported extension,
/// or does not decode into `T`.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| StackError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(serde_json::from_str(&content)?),
        Some("yaml" | "yml") => Ok(serde_yaml::from_str(&content)?),
        other => Err(StackError::Config {
            message: format!(
                "unsupported document extension {:?} for {}: expected .json, .yaml, or .yml",
                other.unwrap_or(""),
                path.display()
            ),
        }),
    }
}
