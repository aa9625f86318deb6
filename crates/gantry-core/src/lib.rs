//! Gantry Core - Shared types for publishing releases to hosting services
//!
//! This crate provides the capability trait every hosting backend implements,
//! the error taxonomy those backends report, and configuration loading.

pub mod config;
pub mod error;
pub mod host;
pub mod types;

pub use error::{ConfigError, ErrorClass, GantryError, HostError, HostResult, Result};
pub use host::ReleaseHost;
pub use types::{
    Artifact, AssetLink, CommitAuthor, HostType, NewRelease, ReleaseHandle, Repo,
};
