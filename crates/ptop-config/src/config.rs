//! Configuration file types.

use serde::{Deserialize, Serialize};

/// Range used when none is configured.
pub const DEFAULT_RANGE: &str = "10m";

/// Workload metrics sampled when the config does not name its own.
pub const DEFAULT_TARGET_METRICS: [&str; 2] = [
    "container_cpu_usage_seconds_total",
    "container_memory_usage_bytes",
];

pub const DEFAULT_PROMETHEUS_URL: &str = "http://localhost:9090";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TABLE: &str = "collated_metrics";

/// Complete prom-top configuration.
///
/// Every field is optional in a config file; missing fields take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Base URL of the Prometheus HTTP API.
    pub prometheus_url: String,

    /// Query-type selector (`quantile`, `average`, `instant`, anything else
    /// runs the default set).
    pub query_type: String,

    /// Lexical duration substituted into windowed templates, e.g. `10m`.
    pub range: String,

    /// Metric names to sample.
    pub metrics: Vec<String>,

    /// Run deadline in seconds; 0 disables the deadline.
    pub timeout_secs: u64,

    /// Build/version tag written into the SQL `version` column.
    pub build_version: String,

    /// Target table of the SQL sink.
    pub table: String,

    /// Optional bearer token sent with every query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            prometheus_url: DEFAULT_PROMETHEUS_URL.to_string(),
            query_type: String::new(),
            range: DEFAULT_RANGE.to_string(),
            metrics: DEFAULT_TARGET_METRICS.iter().map(|m| m.to_string()).collect(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            build_version: String::new(),
            table: DEFAULT_TABLE.to_string(),
            bearer_token: None,
        }
    }
}

impl ToolConfig {
    /// Range with the default substituted for an empty value.
    pub fn effective_range(&self) -> &str {
        if self.range.trim().is_empty() {
            DEFAULT_RANGE
        } else {
            &self.range
        }
    }

    /// Copy of this config with the bearer token masked, for `config show`.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.bearer_token.is_some() {
            copy.bearer_token = Some("<redacted>".to_string());
        }
        copy
    }
}
