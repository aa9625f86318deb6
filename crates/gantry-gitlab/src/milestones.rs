//! Milestone closing

use serde_json::json;
use tracing::{debug, info, instrument};

use gantry_core::{HostError, HostResult, Repo};

use crate::client::GitLabClient;
use crate::encoding::project_id;
use crate::gateway::ApiRequest;
use crate::types::{Milestone, MilestoneState};

impl GitLabClient {
    /// Find the milestone titled exactly `title`
    pub(crate) async fn find_milestone(
        &self,
        repo: &Repo,
        title: &str,
    ) -> HostResult<Option<Milestone>> {
        let request = ApiRequest::get(format!("projects/{}/milestones", project_id(repo)))
            .with_query("title", title);
        let milestones: Vec<Milestone> = self.send_paginated("list milestones", request).await?;
        debug!(candidates = milestones.len(), "listed milestones");

        Ok(milestones.into_iter().find(|m| m.title == title))
    }

    #[instrument(skip(self, repo), fields(project = %repo))]
    pub(crate) async fn close_milestone_by_title(&self, repo: &Repo, title: &str) -> HostResult<()> {
        let milestone = self
            .find_milestone(repo, title)
            .await?
            .ok_or_else(|| HostError::MilestoneNotFound {
                title: title.to_string(),
            })?;

        if milestone.state == MilestoneState::Closed {
            info!(id = milestone.id, "milestone already closed");
            return Ok(());
        }

        let request = ApiRequest::put(format!(
            "projects/{}/milestones/{}",
            project_id(repo),
            milestone.id
        ))
        .with_json(json!({ "state_event": "close" }));
        self.send("close milestone", request).await?;

        info!(id = milestone.id, "milestone closed");
        Ok(())
    }
}
