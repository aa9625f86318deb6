//! Configuration validation

use tracing::debug;
use url::Url;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Upper bound on retry attempts
pub const MAX_RETRY_ATTEMPTS: u32 = 10;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_gitlab(config)?;
    validate_retry(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_gitlab(config: &Config) -> Result<()> {
    if let Err(e) = Url::parse(&config.gitlab.api_url) {
        return Err(ConfigError::InvalidValue {
            field: "gitlab.api_url".to_string(),
            message: format!("not a valid URL: {}", e),
        }
        .into());
    }

    // An empty download URL is allowed; links are then relative.
    if !config.gitlab.download_url.is_empty() {
        if let Err(e) = Url::parse(&config.gitlab.download_url) {
            return Err(ConfigError::InvalidValue {
                field: "gitlab.download_url".to_string(),
                message: format!("not a valid URL: {}", e),
            }
            .into());
        }
    }

    if config.gitlab.use_package_registry
        && config
            .gitlab
            .project_name
            .as_deref()
            .map_or(true, str::is_empty)
    {
        return Err(ConfigError::InvalidValue {
            field: "gitlab.project_name".to_string(),
            message: "required when use_package_registry is enabled".to_string(),
        }
        .into());
    }

    if config.gitlab.timeout_secs == 0 {
        return Err(ConfigError::InvalidValue {
            field: "gitlab.timeout_secs".to_string(),
            message: "must be greater than zero".to_string(),
        }
        .into());
    }

    Ok(())
}

fn validate_retry(config: &Config) -> Result<()> {
    let attempts = config.retry.max_attempts;
    if attempts == 0 || attempts > MAX_RETRY_ATTEMPTS {
        return Err(ConfigError::InvalidValue {
            field: "retry.max_attempts".to_string(),
            message: format!("must be between 1 and {}", MAX_RETRY_ATTEMPTS),
        }
        .into());
    }

    Ok(())
}
