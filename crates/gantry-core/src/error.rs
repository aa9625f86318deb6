//! Error types for Gantry

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using GantryError
pub type Result<T> = std::result::Result<T, GantryError>;

/// Result type for operations against a hosting service
pub type HostResult<T> = std::result::Result<T, HostError>;

/// Main error type for Gantry operations
#[derive(Debug, Error)]
pub enum GantryError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Hosting service errors
    #[error(transparent)]
    Host(#[from] HostError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File extension is neither TOML nor YAML
    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Broad failure classes used to decide how an error is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Read-after-write lag; expected to resolve on retry
    TransientConsistency,
    /// The service rejected the request shape or content
    Validation,
    /// The entity is genuinely absent
    NotFound,
    /// The host could not be reached
    Transport,
    /// The service failed internally
    Server,
    /// The caller cancelled the operation
    Cancelled,
    /// Local failures (IO, unexpected payloads)
    Internal,
}

/// Errors returned by a hosting service backend.
///
/// The gateway maps every non-success response to exactly one of these
/// variants, so callers switch on the variant rather than on status codes.
#[derive(Debug, Error)]
pub enum HostError {
    /// 404 from the service
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// 403 from the service
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// 409 from the service
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// 422 from the service
    #[error("Unprocessable entity: {message}")]
    Unprocessable { message: String },

    /// Any other 4xx
    #[error("Request rejected: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// 5xx from the service
    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },

    /// Unreachable host, refused connection, timeout
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response could not be decoded or lacked a required field
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The operation was cancelled before it completed
    #[error("Operation cancelled")]
    Cancelled,

    /// No milestone carries the requested title
    #[error("No milestone found with title '{title}'")]
    MilestoneNotFound { title: String },

    /// A created resource never became readable
    #[error("{resource} was created but is not visible: {reason}")]
    NotVisible { resource: String, reason: String },

    /// A file write could not be confirmed
    #[error("Write of '{path}' to branch '{branch}' was not confirmed: {reason}")]
    WriteNotConfirmed {
        path: String,
        branch: String,
        reason: String,
    },

    /// IO error while reading local content
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HostError {
    /// Map a non-success HTTP status to its variant
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            403 => Self::Forbidden { message },
            404 => Self::NotFound { message },
            409 => Self::Conflict { message },
            422 => Self::Unprocessable { message },
            500..=599 => Self::Server { status, message },
            _ => Self::Rejected { status, message },
        }
    }

    /// HTTP status behind this error, if it came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Forbidden { .. } => Some(403),
            Self::Conflict { .. } => Some(409),
            Self::Unprocessable { .. } => Some(422),
            Self::Rejected { status, .. } | Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Failure class of this error
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound { .. } | Self::Forbidden { .. } => ErrorClass::TransientConsistency,
            Self::Conflict { .. } | Self::Unprocessable { .. } | Self::Rejected { .. } => {
                ErrorClass::Validation
            }
            Self::MilestoneNotFound { .. }
            | Self::NotVisible { .. }
            | Self::WriteNotConfirmed { .. } => ErrorClass::NotFound,
            Self::Server { .. } => ErrorClass::Server,
            Self::Transport(_) => ErrorClass::Transport,
            Self::Cancelled => ErrorClass::Cancelled,
            Self::InvalidResponse(_) | Self::Io(_) => ErrorClass::Internal,
        }
    }

    /// Whether a retry may observe a different outcome.
    ///
    /// Only 404 and 403 qualify: right after a write the service can answer
    /// either while the new state propagates.
    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::TransientConsistency
    }

    /// Whether the error means "this entity does not exist"
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::MilestoneNotFound { .. }
                | Self::NotVisible { .. }
                | Self::WriteNotConfirmed { .. }
        )
    }
}
