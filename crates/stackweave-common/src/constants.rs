//! System-wide constants and default values.

use std::time::Duration;

/// Default Terraform-registry-compatible base URL.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.terraform.io";

/// Default timeout for a single registry request.
pub const DEFAULT_REGISTRY_TIMEOUT: Duration = Duration::from_secs(10);

/// Default maximum number of cached module contracts.
pub const DEFAULT_CACHE_CAPACITY: u64 = 1_000;

/// Default time-to-live of a cached module contract.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3_600);

/// Minimum combined score a scored variable match must exceed.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.6;

/// Include block pointing at the root configuration.
pub const ROOT_INCLUDE_FILE: &str = "root.hcl";

/// Include block pointing at the shared provider configuration.
pub const PROVIDER_INCLUDE_FILE: &str = "provider.hcl";

/// Relative prefix prepended to a dependency address to form its `config_path`.
pub const DEFAULT_CONFIG_PATH_PREFIX: &str = "../";

/// Commands allowed to run against mock outputs.
pub const MOCK_ALLOWED_COMMANDS: [&str; 3] = ["init", "validate", "plan"];

/// Fixed example CIDR used for network-shaped mock outputs.
pub const MOCK_CIDR: &str = "10.0.0.0/16";

/// Default number of concurrent history lookups.
pub const DEFAULT_HISTORY_CONCURRENCY: usize = 8;

/// Default timeout for a single history lookup.
pub const DEFAULT_HISTORY_TIMEOUT: Duration = Duration::from_secs(5);

/// Window for the change-frequency factor (git `--since` syntax).
pub const DEFAULT_FREQUENCY_WINDOW: &str = "90.days";

/// Window for the recency factor (git `--since` syntax).
pub const DEFAULT_RECENCY_WINDOW: &str = "7.days";

/// Average risk above which an assessment is critical.
pub const DEFAULT_CRITICAL_THRESHOLD: f64 = 0.8;

/// Average risk above which an assessment is high.
pub const DEFAULT_HIGH_THRESHOLD: f64 = 0.6;

/// Average risk above which an assessment is medium.
pub const DEFAULT_MEDIUM_THRESHOLD: f64 = 0.4;

/// Affected-component count above which a change is an emergency change.
pub const EMERGENCY_AFFECTED_COUNT: usize = 10;

/// Application name used in CLI output.
pub const APP_NAME: &str = "stackweave";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "stw";
