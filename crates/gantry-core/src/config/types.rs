//! Configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults::{DEFAULT_GITLAB_API_URL, DEFAULT_GITLAB_DOWNLOAD_URL};

/// Main configuration for Gantry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Version of the config schema
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// GitLab endpoints and upload behaviour
    pub gitlab: GitLabConfig,

    /// Retry policy for read-after-write checks
    pub retry: RetryConfig,

    /// File publishing behaviour
    pub files: FilesConfig,
}

/// GitLab configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitLabConfig {
    /// Fully resolved API base URL, including the `/api/v4` suffix
    pub api_url: String,

    /// Fully resolved base URL used to build asset download links
    pub download_url: String,

    /// Upload assets to the generic package registry instead of project uploads
    pub use_package_registry: bool,

    /// Replace release links that already exist with the same name
    pub replace_existing_artifacts: bool,

    /// Package name used by the generic package registry
    pub project_name: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GITLAB_API_URL.to_string(),
            download_url: DEFAULT_GITLAB_DOWNLOAD_URL.to_string(),
            use_package_registry: false,
            replace_existing_artifacts: false,
            project_name: None,
            timeout_secs: 30,
        }
    }
}

impl GitLabConfig {
    /// Set the API URL
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the download URL
    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = url.into();
        self
    }

    /// Enable the generic package registry for uploads
    pub fn with_package_registry(mut self, project_name: impl Into<String>) -> Self {
        self.use_package_registry = true;
        self.project_name = Some(project_name.into());
        self
    }

    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 500,
        }
    }
}

impl RetryConfig {
    /// Delay between attempts as a duration
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// File publishing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Read a file back after writing it; when off the write response is trusted
    pub verify_writes: bool,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            verify_writes: true,
        }
    }
}
