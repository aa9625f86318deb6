//! Release asset uploads

use bytes::Bytes;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use gantry_core::{Artifact, AssetLink, HostError, HostResult, ReleaseHandle};

use crate::client::GitLabClient;
use crate::encoding::{encode_segment, project_id};
use crate::gateway::ApiRequest;
use crate::release::release_path;
use crate::types::{ProjectUpload, ReleaseLink};

/// GitLab's wording when a link name or URL is reused
const ALREADY_TAKEN: &str = "has already been taken";

impl GitLabClient {
    /// Upload an artifact and attach it to the release as a link
    #[instrument(
        skip(self, release, artifact),
        fields(project = %release.repo, tag = %release.tag, name = %artifact.name)
    )]
    pub(crate) async fn upload(
        &self,
        release: &ReleaseHandle,
        artifact: Artifact,
    ) -> HostResult<AssetLink> {
        let name = artifact.name.clone();
        let content = Bytes::from(artifact.into_bytes().await?);
        debug!(bytes = content.len(), "read artifact");

        let url = if self.config.use_package_registry {
            self.upload_to_package_registry(release, &name, content)
                .await?
        } else {
            self.upload_to_project(release, &name, content).await?
        };

        self.link_asset(release, &name, &url).await
    }

    async fn upload_to_package_registry(
        &self,
        release: &ReleaseHandle,
        name: &str,
        content: Bytes,
    ) -> HostResult<String> {
        let package = self
            .config
            .project_name
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| package_fallback(&release.repo.name));

        let path = format!(
            "projects/{}/packages/generic/{}/{}/{}",
            project_id(&release.repo),
            encode_segment(package),
            encode_segment(&release.version),
            encode_segment(name)
        );
        self.send(
            "upload package file",
            ApiRequest::put(&path).with_bytes(content),
        )
        .await?;

        let url = format!("{}/{}", self.config.api_url.trim_end_matches('/'), path);
        debug!(url = %url, "uploaded to package registry");
        Ok(url)
    }

    async fn upload_to_project(
        &self,
        release: &ReleaseHandle,
        name: &str,
        content: Bytes,
    ) -> HostResult<String> {
        let request = ApiRequest::post(format!("projects/{}/uploads", project_id(&release.repo)))
            .with_file(name, content);
        let upload: ProjectUpload = self.send("upload project file", request).await?.json()?;

        let base = self.config.download_url.trim_end_matches('/');
        let url = match (upload.full_path, upload.url) {
            (Some(full_path), _) if !full_path.is_empty() => format!("{}{}", base, full_path),
            (_, Some(url)) if !url.is_empty() => {
                format!("{}/{}{}", base, release.repo.path(), url)
            }
            _ => {
                return Err(HostError::InvalidResponse(
                    "upload response carries no file URL".to_string(),
                ))
            }
        };
        debug!(url = %url, "uploaded to project");
        Ok(url)
    }

    async fn link_asset(
        &self,
        release: &ReleaseHandle,
        name: &str,
        url: &str,
    ) -> HostResult<AssetLink> {
        let links_path = format!(
            "{}/assets/links",
            release_path(&project_id(&release.repo), &release.tag)
        );
        let create = ApiRequest::post(&links_path).with_json(json!({ "name": name, "url": url }));

        let response = match self.send("create release link", create.clone()).await {
            Ok(response) => response,
            Err(HostError::Unprocessable { message })
                if self.config.replace_existing_artifacts && message.contains(ALREADY_TAKEN) =>
            {
                warn!(%message, "release link exists, replacing it");
                self.delete_link(&links_path, name, url).await?;
                self.send("create release link", create).await?
            }
            Err(e) => return Err(e),
        };

        let link = response.json::<ReleaseLink>()?.into_asset_link(name, url);
        info!(id = link.id, url = %link.url, "asset linked to release");
        Ok(link)
    }

    async fn delete_link(&self, links_path: &str, name: &str, url: &str) -> HostResult<()> {
        let links: Vec<ReleaseLink> = self
            .send_paginated("list release links", ApiRequest::get(links_path))
            .await?;

        let existing = links
            .into_iter()
            .find(|l| l.name == name || l.url == url)
            .ok_or_else(|| {
                HostError::InvalidResponse(format!(
                    "link '{}' reported as taken but not listed",
                    name
                ))
            })?;

        self.send(
            "delete release link",
            ApiRequest::delete(format!("{}/{}", links_path, existing.id)),
        )
        .await?;
        debug!(id = existing.id, "deleted existing release link");
        Ok(())
    }
}

/// Last path component of a repository name
fn package_fallback(repo_name: &str) -> &str {
    repo_name.rsplit('/').next().unwrap_or(repo_name)
}
