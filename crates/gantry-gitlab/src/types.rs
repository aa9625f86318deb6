//! GitLab REST payloads
//!
//! Only the fields the client reads are modelled. Everything is optional or
//! defaulted so that sparse responses still decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use gantry_core::{AssetLink, NewRelease, ReleaseHandle, Repo};

/// `GET projects/:id/releases/:tag`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Release {
    pub tag_name: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Release {
    /// Combine the service's view of a release with the caller's request
    pub fn into_handle(self, repo: &Repo, requested: &NewRelease) -> ReleaseHandle {
        let tag = self
            .tag_name
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| requested.tag.clone());
        ReleaseHandle {
            repo: repo.clone(),
            name: self
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| requested.title().to_string()),
            description: self
                .description
                .unwrap_or_else(|| requested.description.clone()),
            version: requested.version.clone().unwrap_or_else(|| tag.clone()),
            tag,
            created_at: self.created_at,
        }
    }
}

/// `GET projects/:id`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Project {
    pub id: Option<u64>,
    pub path_with_namespace: Option<String>,
    pub default_branch: Option<String>,
}

/// Response of a repository file create or update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileWrite {
    pub file_path: Option<String>,
    pub branch: Option<String>,
}

/// `GET projects/:id/repository/files/:path`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RepositoryFile {
    pub file_path: Option<String>,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
}

/// `GET projects/:id/repository/compare`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Comparison {
    pub commits: Vec<CommitSummary>,
}

/// A commit as listed by the compare endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommitSummary {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub short_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub author_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub author_email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub parent_ids: Vec<String>,
}

/// Decode `null` as the type's default instead of failing
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl CommitSummary {
    /// Commits with more than one parent are merges
    pub fn is_merge(&self) -> bool {
        self.parent_ids.len() > 1
    }

    /// Abbreviated id, derived from the full id when the service omits it
    pub fn short_id(&self) -> &str {
        if !self.short_id.is_empty() {
            return &self.short_id;
        }
        match self.id.char_indices().nth(8) {
            Some((end, _)) => &self.id[..end],
            None => &self.id,
        }
    }

    /// Subject line, derived from the message when the service omits it
    pub fn title(&self) -> &str {
        if !self.title.is_empty() {
            return &self.title;
        }
        self.message.lines().next().unwrap_or_default()
    }
}

/// Milestone lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneState {
    #[default]
    Active,
    Closed,
}

/// `GET projects/:id/milestones`
#[derive(Debug, Clone, Deserialize)]
pub struct Milestone {
    pub id: u64,
    #[serde(default)]
    pub iid: Option<u64>,
    pub title: String,
    #[serde(default)]
    pub state: MilestoneState,
}

/// `POST projects/:id/uploads`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectUpload {
    pub alt: Option<String>,
    pub url: Option<String>,
    pub full_path: Option<String>,
}

/// Release asset link
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReleaseLink {
    pub id: u64,
    pub name: String,
    pub url: String,
}

impl ReleaseLink {
    /// Convert into the shared link type, filling gaps from the request
    pub fn into_asset_link(self, name: &str, url: &str) -> AssetLink {
        AssetLink {
            id: self.id,
            name: if self.name.is_empty() {
                name.to_string()
            } else {
                self.name
            },
            url: if self.url.is_empty() {
                url.to_string()
            } else {
                self.url
            },
        }
    }
}
