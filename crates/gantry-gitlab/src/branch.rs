//! Branch resolution

use tracing::{debug, instrument};

use gantry_core::{HostError, HostResult, Repo};

use crate::client::GitLabClient;
use crate::encoding::project_id;
use crate::gateway::ApiRequest;
use crate::types::Project;

impl GitLabClient {
    #[instrument(skip(self, repo), fields(project = %repo))]
    pub(crate) async fn project_default_branch(&self, repo: &Repo) -> HostResult<String> {
        let response = self
            .send(
                "get project",
                ApiRequest::get(format!("projects/{}", project_id(repo))),
            )
            .await?;

        let branch = response
            .json::<Project>()?
            .default_branch
            .filter(|b| !b.is_empty())
            .ok_or_else(|| {
                HostError::InvalidResponse(format!("project {} has no default branch", repo))
            })?;

        debug!(branch = %branch, "resolved default branch");
        Ok(branch)
    }

    /// Branch a write targets: the explicit one, else the project default
    pub(crate) async fn resolve_branch(&self, repo: &Repo) -> HostResult<String> {
        match repo.explicit_branch() {
            Some(branch) => Ok(branch.to_string()),
            None => self.project_default_branch(repo).await,
        }
    }
}
