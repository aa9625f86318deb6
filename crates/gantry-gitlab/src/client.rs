//! GitLab client

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use gantry_core::config::{Config, GitLabConfig};
use gantry_core::{
    Artifact, AssetLink, CommitAuthor, HostResult, HostType, NewRelease, ReleaseHandle,
    ReleaseHost, Repo,
};

use crate::gateway::{ApiRequest, ApiResponse, Gateway, HttpGateway};
use crate::retry::{retry_transient, with_retry, RetryPolicy};

/// GitLab release host.
///
/// Holds no per-call state; one client can serve any number of sequential
/// or concurrent operations.
pub struct GitLabClient {
    pub(crate) gateway: Arc<dyn Gateway>,
    pub(crate) config: GitLabConfig,
    pub(crate) retry: RetryPolicy,
    pub(crate) verify_writes: bool,
    pub(crate) cancel: CancellationToken,
}

impl GitLabClient {
    /// Create a client that talks to `config.gitlab.api_url` over HTTP
    pub fn new(config: &Config, token: impl Into<String>) -> HostResult<Self> {
        let gateway = HttpGateway::new(&config.gitlab.api_url, token, config.gitlab.timeout())?;
        Ok(Self::with_gateway(config, Arc::new(gateway)))
    }

    /// Create a client over a custom gateway
    pub fn with_gateway(config: &Config, gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            config: config.gitlab.clone(),
            retry: RetryPolicy::from(&config.retry),
            verify_writes: config.files.verify_writes,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort in-flight requests and pending retries when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// One round trip, never retried
    pub(crate) async fn send(&self, operation: &str, request: ApiRequest) -> HostResult<ApiResponse> {
        with_retry(
            &self.retry,
            &self.cancel,
            operation,
            || self.gateway.send(&request),
            |_| false,
        )
        .await
    }

    /// Round trips until the request stops answering 404/403
    pub(crate) async fn send_until_visible(
        &self,
        operation: &str,
        request: ApiRequest,
    ) -> HostResult<ApiResponse> {
        retry_transient(&self.retry, &self.cancel, operation, || {
            self.gateway.send(&request)
        })
        .await
    }

    /// Fetch every page of a listing and flatten the items.
    ///
    /// Each page is requested at most once; a `next_page` that points back at
    /// a page already fetched ends the listing.
    pub(crate) async fn send_paginated<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: ApiRequest,
    ) -> HostResult<Vec<T>> {
        let mut items = Vec::new();
        let mut page: Option<u32> = None;
        let mut visited: HashSet<u32> = HashSet::from([1]);

        loop {
            let mut paged = request.clone();
            if let Some(page) = page {
                paged = paged.with_query("page", page.to_string());
            }

            let response = self.send(operation, paged).await?;
            items.extend(response.json::<Vec<T>>()?);

            match response.next_page {
                Some(next) if visited.insert(next) => {
                    debug!(operation, page = next, "following next page");
                    page = Some(next);
                }
                Some(next) => {
                    warn!(operation, page = next, "next page already fetched, stopping");
                    break;
                }
                None => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl ReleaseHost for GitLabClient {
    fn name(&self) -> &str {
        "GitLab"
    }

    fn host_type(&self) -> HostType {
        HostType::GitLab
    }

    async fn get_or_create_release(
        &self,
        repo: &Repo,
        release: &NewRelease,
    ) -> HostResult<ReleaseHandle> {
        self.resolve_release(repo, release).await
    }

    async fn upload_asset(
        &self,
        release: &ReleaseHandle,
        artifact: Artifact,
    ) -> HostResult<AssetLink> {
        self.upload(release, artifact).await
    }

    async fn create_file(
        &self,
        author: &CommitAuthor,
        repo: &Repo,
        content: &[u8],
        path: &str,
        message: &str,
    ) -> HostResult<()> {
        self.publish_file(author, repo, content, path, message).await
    }

    async fn changelog(&self, repo: &Repo, from: &str, to: &str) -> HostResult<String> {
        self.compare_changelog(repo, from, to).await
    }

    async fn close_milestone(&self, repo: &Repo, title: &str) -> HostResult<()> {
        self.close_milestone_by_title(repo, title).await
    }

    async fn default_branch(&self, repo: &Repo) -> HostResult<String> {
        self.project_default_branch(repo).await
    }
}
