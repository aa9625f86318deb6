//! GitLab backend for Gantry
//!
//! Publishes releases, release assets, repository files and milestone state
//! to GitLab through its v4 REST API.
//!
//! GitLab answers 404 or 403 for a short while after a write becomes durable.
//! Every read that follows a write therefore goes through [`retry`], and a
//! write only counts as done once a follow-up read confirms it.
//!
//! ## Usage
//!
//! ```ignore
//! use gantry_core::{config::Config, NewRelease, ReleaseHost, Repo};
//! use gantry_gitlab::GitLabClient;
//!
//! let client = GitLabClient::new(&Config::default(), token)?;
//! let repo = Repo::new("group", "project");
//! let release = client
//!     .get_or_create_release(&repo, &NewRelease::new("v1.0.0"))
//!     .await?;
//! ```

pub mod changelog;
pub mod client;
pub mod encoding;
pub mod gateway;
pub mod retry;
pub mod types;

mod branch;
mod files;
mod milestones;
mod release;
mod upload;

#[cfg(test)]
mod testing;

pub use changelog::format_changelog;
pub use client::GitLabClient;
pub use gateway::{ApiRequest, ApiResponse, Gateway, HttpGateway, RequestBody};
pub use retry::{retry_transient, with_retry, RetryPolicy};
