//! Semantic validation of a resolved configuration.
//!
//! Errors make the config unusable. Warnings are reported and the run
//! proceeds; a malformed range is only a warning because the backend is the
//! authority on duration syntax.

use crate::config::ToolConfig;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(ms|s|m|h|d|w|y)$").expect("static regex"));

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$").expect("static regex"));

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("prometheus_url must start with http:// or https://, got {0:?}")]
    InvalidUrl(String),
    #[error("metrics list is empty")]
    NoMetrics,
    #[error("metric name at index {0} is blank")]
    BlankMetric(usize),
    #[error("table name {0:?} is not a plain SQL identifier")]
    InvalidTable(String),
}

/// Outcome of validating a config.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check whether a range string matches the lexical duration format.
pub fn is_lexical_range(range: &str) -> bool {
    RANGE_RE.is_match(range)
}

/// Validate a configuration.
pub fn validate(config: &ToolConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    let url = config.prometheus_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        result
            .errors
            .push(ValidationError::InvalidUrl(config.prometheus_url.clone()));
    }

    if config.metrics.is_empty() {
        result.errors.push(ValidationError::NoMetrics);
    }
    for (i, metric) in config.metrics.iter().enumerate() {
        if metric.trim().is_empty() {
            result.errors.push(ValidationError::BlankMetric(i));
        }
    }

    if !IDENT_RE.is_match(&config.table) {
        result
            .errors
            .push(ValidationError::InvalidTable(config.table.clone()));
    }

    let range = config.effective_range();
    if !is_lexical_range(range) {
        result.warnings.push(format!(
            "range {:?} does not look like <int><ms|s|m|h|d|w|y>; the backend will decide",
            range
        ));
    }

    if config.timeout_secs == 0 {
        result
            .warnings
            .push("timeout_secs = 0: the run has no deadline".to_string());
    }

    result
}
