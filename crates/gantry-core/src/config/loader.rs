//! Configuration loading

use std::path::Path;

use tracing::{debug, info};

use crate::error::{ConfigError, Result};

use super::types::Config;
use super::validation::validate_config;

/// Serialization format of a configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// Format implied by a file extension; `None` for anything else
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Parse and validate a configuration document
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<Config> {
    let config: Config = match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(ConfigError::TomlError)?,
        ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(ConfigError::YamlError)?,
    };
    validate_config(&config)?;
    Ok(config)
}

/// Load a `gantry.toml` or `gantry.yaml` from an explicit path
pub fn load_config(path: &Path) -> Result<Config> {
    let format = ConfigFormat::from_path(path)
        .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;
    info!(path = %path.display(), ?format, "loading config");

    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config = parse_config(&content, format)?;
    debug!(api_url = %config.gitlab.api_url, "config loaded");
    Ok(config)
}
