//! Configuration model for the Stackweave engine.
//!
//! Every section has a `Default` built from [`crate::constants`]; a TOML file
//! only needs to name the values it overrides.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{Result, StackError};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Module registry access.
    pub registry: RegistryConfig,
    /// Variable mapping.
    pub mapper: MapperConfig,
    /// Config text generation.
    pub generator: GeneratorConfig,
    /// Risk and blast-radius analysis.
    pub risk: RiskConfig,
    /// Batch execution.
    pub batch: BatchConfig,
}

impl StackConfig {
    /// Loads a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| StackError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this model.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `StackError::Config` if thresholds are out of order or out of range.
    pub fn validate(&self) -> Result<()> {
        let t = &self.risk;
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !(in_unit(t.medium_threshold) && in_unit(t.high_threshold) && in_unit(t.critical_threshold)) {
            return Err(StackError::Config {
                message: "risk thresholds must lie in [0, 1]".into(),
            });
        }
        if !(t.medium_threshold <= t.high_threshold && t.high_threshold <= t.critical_threshold) {
            return Err(StackError::Config {
                message: "risk thresholds must satisfy medium <= high <= critical".into(),
            });
        }
        if !in_unit(self.mapper.threshold) {
            return Err(StackError::Config {
                message: format!("mapper threshold {} is outside [0, 1]", self.mapper.threshold),
            });
        }
        if t.history_concurrency == 0 {
            return Err(StackError::Config {
                message: "history_concurrency must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Module registry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Base URL of the registry HTTP API.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of cached module contracts.
    pub cache_capacity: u64,
    /// Time-to-live of a cached contract in seconds.
    pub cache_ttl_secs: u64,
}

impl RegistryConfig {
    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Cache time-to-live.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: constants::DEFAULT_REGISTRY_URL.into(),
            timeout_ms: duration_millis(constants::DEFAULT_REGISTRY_TIMEOUT),
            cache_capacity: constants::DEFAULT_CACHE_CAPACITY,
            cache_ttl_secs: constants::DEFAULT_CACHE_TTL.as_secs(),
        }
    }
}

/// Variable mapper settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Minimum combined score a scored match must exceed.
    pub threshold: f64,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            threshold: constants::DEFAULT_MATCH_THRESHOLD,
        }
    }
}

/// Config generator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// File located by the `root` include block.
    pub root_include: String,
    /// File located by the `provider` include block.
    pub provider_include: String,
    /// Prefix joined with a dependency address to form its `config_path`.
    pub config_path_prefix: String,
    /// Commands allowed to run against mock outputs.
    pub mock_allowed_commands: Vec<String>,
    /// Whether to emit a `terraform { source = ... }` block.
    pub emit_source: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            root_include: constants::ROOT_INCLUDE_FILE.into(),
            provider_include: constants::PROVIDER_INCLUDE_FILE.into(),
            config_path_prefix: constants::DEFAULT_CONFIG_PATH_PREFIX.into(),
            mock_allowed_commands: constants::MOCK_ALLOWED_COMMANDS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            emit_source: false,
        }
    }
}

/// How far a change propagates through dependents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropagationMode {
    /// Direct dependents of changed components only.
    #[default]
    SingleHop,
    /// Dependents up to the given number of hops away.
    HopLimited(u32),
    /// Every transitive dependent.
    Transitive,
}

impl PropagationMode {
    /// Maximum hop count, or `None` for an unbounded closure.
    #[must_use]
    pub const fn max_hops(self) -> Option<u32> {
        match self {
            Self::SingleHop => Some(1),
            Self::HopLimited(n) => Some(n),
            Self::Transitive => None,
        }
    }
}

impl fmt::Display for PropagationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleHop => write!(f, "single-hop"),
            Self::HopLimited(n) => write!(f, "hops:{n}"),
            Self::Transitive => write!(f, "transitive"),
        }
    }
}

impl FromStr for PropagationMode {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "single-hop" | "single" => Ok(Self::SingleHop),
            "transitive" | "all" => Ok(Self::Transitive),
            other => other
                .strip_prefix("hops:")
                .and_then(|n| n.parse().ok())
                .map(Self::HopLimited)
                .ok_or_else(|| StackError::Config {
                    message: format!(
                        "invalid propagation mode \"{other}\": expected single-hop, transitive, or hops:N"
                    ),
                }),
        }
    }
}

/// Which graph edges feed change propagation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeView {
    /// Every dependency edge.
    #[default]
    All,
    /// One edge per dependent: its last-declared dependency.
    LastDeclared,
}

impl fmt::Display for EdgeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::LastDeclared => write!(f, "last-declared"),
        }
    }
}

impl FromStr for EdgeView {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "last-declared" => Ok(Self::LastDeclared),
            other => Err(StackError::Config {
                message: format!("invalid edge view \"{other}\": expected all or last-declared"),
            }),
        }
    }
}

/// Risk analysis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Average risk above which an assessment is critical.
    pub critical_threshold: f64,
    /// Average risk above which an assessment is high.
    pub high_threshold: f64,
    /// Average risk above which an assessment is medium.
    pub medium_threshold: f64,
    /// Window for the change-frequency factor.
    pub frequency_window: String,
    /// Window for the recency factor.
    pub recency_window: String,
    /// Maximum concurrent history lookups.
    pub history_concurrency: usize,
    /// Per-lookup timeout in milliseconds.
    pub history_timeout_ms: u64,
    /// Propagation mode.
    pub propagation: PropagationMode,
    /// Edge view used for propagation.
    pub edge_view: EdgeView,
}

impl RiskConfig {
    /// Per-lookup timeout.
    #[must_use]
    pub const fn history_timeout(&self) -> Duration {
        Duration::from_millis(self.history_timeout_ms)
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            critical_threshold: constants::DEFAULT_CRITICAL_THRESHOLD,
            high_threshold: constants::DEFAULT_HIGH_THRESHOLD,
            medium_threshold: constants::DEFAULT_MEDIUM_THRESHOLD,
            frequency_window: constants::DEFAULT_FREQUENCY_WINDOW.into(),
            recency_window: constants::DEFAULT_RECENCY_WINDOW.into(),
            history_concurrency: constants::DEFAULT_HISTORY_CONCURRENCY,
            history_timeout_ms: duration_millis(constants::DEFAULT_HISTORY_TIMEOUT),
            propagation: PropagationMode::default(),
            edge_view: EdgeView::default(),
        }
    }
}

/// Batch execution settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker threads for batch generation; `0` uses the number of CPUs.
    pub workers: usize,
}

fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = StackConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.risk.propagation, PropagationMode::SingleHop);
        assert_eq!(config.registry.cache_ttl(), constants::DEFAULT_CACHE_TTL);
    }

    #[test]
    fn partial_toml_overrides_only_named_values() {
        let config = StackConfig::from_toml(
            r#"
[risk]
high_threshold = 0.7
propagation = "transitive"
edge_view = "last-declared"

[batch]
workers = 4
"#,
        )
        .expect("parse");
        assert!((config.risk.high_threshold - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.risk.propagation, PropagationMode::Transitive);
        assert_eq!(config.risk.edge_view, EdgeView::LastDeclared);
        assert_eq!(config.batch.workers, 4);
        assert_eq!(config.registry, RegistryConfig::default());
    }

    #[test]
    fn hop_limited_mode_from_toml() {
        let config = StackConfig::from_toml("[risk]\npropagation = { hop-limited = 3 }\n").expect("parse");
        assert_eq!(config.risk.propagation, PropagationMode::HopLimited(3));
    }

    #[test]
    fn out_of_order_thresholds_rejected() {
        let err = StackConfig::from_toml("[risk]\nmedium_threshold = 0.9\n").unwrap_err();
        assert!(err.to_string().contains("medium <= high"), "got: {err}");
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stackweave.toml");
        std::fs::write(&path, "[mapper]\nthreshold = 0.5\n").expect("write");
        let config = StackConfig::load(&path).expect("load");
        assert!((config.mapper.threshold - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn propagation_mode_parses_cli_forms() {
        assert_eq!("single-hop".parse::<PropagationMode>().expect("parse"), PropagationMode::SingleHop);
        assert_eq!("hops:2".parse::<PropagationMode>().expect("parse"), PropagationMode::HopLimited(2));
        assert_eq!(PropagationMode::HopLimited(2).to_string(), "hops:2");
        assert!("hops:x".parse::<PropagationMode>().is_err());
        assert_eq!(PropagationMode::Transitive.max_hops(), None);
    }
}
