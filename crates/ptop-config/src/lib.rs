//! prom-top configuration loading and validation.
//!
//! This crate provides:
//! - The typed `ToolConfig` file format (TOML, YAML, or JSON)
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation with non-fatal warnings

pub mod config;
pub mod resolve;
pub mod validate;

pub use config::{ToolConfig, DEFAULT_RANGE, DEFAULT_TARGET_METRICS};
pub use resolve::{resolve_config, ConfigError, ConfigSource, ResolvedConfig};
pub use validate::{validate, ValidationError, ValidationResult};

/// Name of the configuration directory under the XDG config home.
pub const CONFIG_DIR_NAME: &str = "prom-top";
