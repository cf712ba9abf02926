//! Unified error types for the Stackweave workspace.
//!
//! Composition errors are scoped to a single component wherever possible so
//! that batch operations can report them per item instead of aborting.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum StackError {
    /// The module registry could not be reached.
    #[error("module registry unavailable for {module}: {reason}")]
    RegistryUnavailable {
        /// Module identity (`namespace/name/provider`).
        module: String,
        /// Transport or service failure description.
        reason: String,
    },

    /// A component references another component that is not declared.
    #[error("component \"{component}\" references unknown component \"{reference}\"")]
    UnresolvedDependency {
        /// Component holding the reference.
        component: String,
        /// Name of the missing component.
        reference: String,
    },

    /// The registry has no definition for a component's module.
    #[error("no module definition for {module} (component \"{component}\")")]
    MissingModuleDefinition {
        /// Component whose module failed to resolve.
        component: String,
        /// Module identity (`namespace/name/provider`).
        module: String,
    },

    /// Rendering the orchestration configuration failed.
    #[error("failed to render config for \"{component}\": {message}")]
    ConfigRender {
        /// Component being rendered.
        component: String,
        /// Description of the render failure.
        message: String,
    },

    /// A change-history lookup failed or timed out.
    #[error("history lookup failed for {path}: {reason}")]
    HistoryLookup {
        /// Path whose history was queried.
        path: String,
        /// Description of the failure.
        reason: String,
    },

    /// The dependency graph contains a cycle.
    #[error("cyclic dependency detected: {}", members.join(" -> "))]
    CycleDetected {
        /// Component addresses along the cycle, in traversal order.
        members: Vec<String>,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value or declaration is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// YAML deserialization failed.
    #[error("yaml error: {source}")]
    Yaml {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },

    /// TOML deserialization failed.
    #[error("toml error: {source}")]
    Toml {
        /// Underlying TOML error.
        #[from]
        source: toml::de::Error,
    },
}

impl StackError {
    /// Returns whether the caller may degrade gracefully instead of failing.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::RegistryUnavailable { .. } | Self::HistoryLookup { .. }
        )
    }

    /// Returns the component this error is scoped to, if any.
    #[must_use]
    pub fn component(&self) -> Option<&str> {
        match self {
            Self::UnresolvedDependency { component, .. }
            | Self::MissingModuleDefinition { component, .. }
            | Self::ConfigRender { component, .. } => Some(component),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, StackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_lists_members_in_order() {
        let err = StackError::CycleDetected {
            members: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "cyclic dependency detected: a -> b -> a");
    }

    #[test]
    fn recoverable_kinds() {
        let unavailable = StackError::RegistryUnavailable {
            module: "terraform-aws-modules/vpc/aws".into(),
            reason: "timeout".into(),
        };
        let missing = StackError::MissingModuleDefinition {
            component: "vpc".into(),
            module: "terraform-aws-modules/vpc/aws".into(),
        };
        assert!(unavailable.is_recoverable());
        assert!(!missing.is_recoverable());
        assert_eq!(missing.component(), Some("vpc"));
        assert_eq!(unavailable.component(), None);
    }
}
