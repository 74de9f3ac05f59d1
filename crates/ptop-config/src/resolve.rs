//! Config resolution: CLI path → env → XDG config dir → built-in defaults.
//!
//! File format is detected from the extension (`.toml`, `.yaml`/`.yml`,
//! `.json`). A missing file at the XDG default location is not an error;
//! a missing file named explicitly (flag or `PTOP_CONFIG`) is.

use crate::config::ToolConfig;
use crate::CONFIG_DIR_NAME;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const ENV_CONFIG_PATH: &str = "PTOP_CONFIG";
pub const ENV_PROMETHEUS_URL: &str = "PTOP_PROMETHEUS_URL";
pub const ENV_RANGE: &str = "PTOP_RANGE";
pub const ENV_QUERY_TYPE: &str = "PTOP_QUERY_TYPE";
pub const ENV_BEARER_TOKEN: &str = "PTOP_BEARER_TOKEN";

const DEFAULT_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported config format: {extension:?}")]
    UnsupportedFormat { extension: String },
    #[error("failed to parse {format} config {path}: {message}")]
    Parse {
        format: String,
        path: PathBuf,
        message: String,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }

    fn detect(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "toml" => Ok(Self::Toml),
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat { extension: ext }),
        }
    }
}

/// Where the effective configuration file came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config <path>`.
    Cli(PathBuf),
    /// `PTOP_CONFIG=<path>`.
    Env(PathBuf),
    /// `$XDG_CONFIG_HOME/prom-top/config.toml`.
    Xdg(PathBuf),
    /// No file; built-in defaults.
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::Cli(p) | ConfigSource::Env(p) | ConfigSource::Xdg(p) => Some(p),
            ConfigSource::Defaults => None,
        }
    }
}

/// Configuration after file loading and environment overrides.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: ToolConfig,
    pub source: ConfigSource,
    /// Names of the environment variables that overrode file values.
    pub env_overrides: Vec<&'static str>,
}

/// Resolve configuration from the process environment.
pub fn resolve_config(explicit: Option<&Path>) -> Result<ResolvedConfig, ConfigError> {
    let xdg = dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(DEFAULT_FILE_NAME));
    resolve_config_with(explicit, |key| std::env::var(key).ok(), xdg)
}

/// Resolve configuration with an injected environment and XDG location.
pub fn resolve_config_with<F>(
    explicit: Option<&Path>,
    env: F,
    xdg_file: Option<PathBuf>,
) -> Result<ResolvedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let env_path = env(ENV_CONFIG_PATH)
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);

    let (mut config, source) = if let Some(path) = explicit {
        (load_config_from_path(path)?, ConfigSource::Cli(path.to_path_buf()))
    } else if let Some(path) = env_path {
        let config = load_config_from_path(&path)?;
        (config, ConfigSource::Env(path))
    } else {
        match xdg_file {
            Some(path) if path.exists() => {
                let config = load_config_from_path(&path)?;
                (config, ConfigSource::Xdg(path))
            }
            _ => (ToolConfig::default(), ConfigSource::Defaults),
        }
    };

    let env_overrides = apply_env_overrides(&mut config, &env);
    debug!(
        target: "ptop.config",
        source = ?source,
        overrides = ?env_overrides,
        "Resolved configuration"
    );

    Ok(ResolvedConfig {
        config,
        source,
        env_overrides,
    })
}

fn apply_env_overrides<F>(config: &mut ToolConfig, env: &F) -> Vec<&'static str>
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = Vec::new();
    if let Some(url) = env(ENV_PROMETHEUS_URL) {
        config.prometheus_url = url;
        applied.push(ENV_PROMETHEUS_URL);
    }
    if let Some(range) = env(ENV_RANGE) {
        config.range = range;
        applied.push(ENV_RANGE);
    }
    if let Some(query_type) = env(ENV_QUERY_TYPE) {
        config.query_type = query_type;
        applied.push(ENV_QUERY_TYPE);
    }
    if let Some(token) = env(ENV_BEARER_TOKEN).filter(|t| !t.is_empty()) {
        config.bearer_token = Some(token);
        applied.push(ENV_BEARER_TOKEN);
    }
    applied
}

/// Load a config file, detecting the format from its extension.
pub fn load_config_from_path(path: &Path) -> Result<ToolConfig, ConfigError> {
    let format = ConfigFormat::detect(path)?;
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_str(&content, format).map_err(|message| ConfigError::Parse {
        format: format.as_str().to_string(),
        path: path.to_path_buf(),
        message,
    })
}

/// Parse config text in the given format.
pub fn parse_config_str(content: &str, format: ConfigFormat) -> Result<ToolConfig, String> {
    match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
    }
}
