//! Default configuration values

/// GitLab.com API base URL
pub const DEFAULT_GITLAB_API_URL: &str = "https://gitlab.com/api/v4";

/// GitLab.com web URL, used for asset download links
pub const DEFAULT_GITLAB_DOWNLOAD_URL: &str = "https://gitlab.com";

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Gantry Configuration

[gitlab]
api_url = "https://gitlab.com/api/v4"
download_url = "https://gitlab.com"
use_package_registry = false
replace_existing_artifacts = false
timeout_secs = 30

[retry]
max_attempts = 3
delay_ms = 500

[files]
verify_writes = true
"#;
