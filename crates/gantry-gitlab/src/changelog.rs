//! Changelog rendering from the compare endpoint

use tracing::{debug, instrument};

use gantry_core::{HostResult, Repo};

use crate::client::GitLabClient;
use crate::encoding::project_id;
use crate::gateway::ApiRequest;
use crate::types::{CommitSummary, Comparison};

/// Render commits as `<short id>: <title> (<name> <<email>>)`, one per line,
/// skipping merges and keeping the service's order.
pub fn format_changelog(commits: &[CommitSummary]) -> String {
    commits
        .iter()
        .filter(|c| !c.is_merge())
        .map(|c| {
            format!(
                "{}: {} ({} <{}>)",
                c.short_id(),
                c.title(),
                c.author_name,
                c.author_email
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl GitLabClient {
    #[instrument(skip(self, repo), fields(project = %repo))]
    pub(crate) async fn compare_changelog(
        &self,
        repo: &Repo,
        from: &str,
        to: &str,
    ) -> HostResult<String> {
        let request = ApiRequest::get(format!("projects/{}/repository/compare", project_id(repo)))
            .with_query("from", from)
            .with_query("to", to);

        let comparison: Comparison = self.send("compare refs", request).await?.json()?;
        debug!(commits = comparison.commits.len(), "fetched comparison");

        Ok(format_changelog(&comparison.commits))
    }
}
