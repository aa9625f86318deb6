//! Core types for Gantry

use std::fmt;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Kind of hosting service behind a [`crate::ReleaseHost`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostType {
    /// GitLab (gitlab.com or self-managed)
    GitLab,
}

impl HostType {
    /// Returns the string representation of the host type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitLab => "gitlab",
        }
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A repository on the hosting service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repo {
    /// Owning user or group; may be empty
    #[serde(default)]
    pub owner: String,
    /// Repository name; may contain `/` for subgroups
    pub name: String,
    /// Branch to target; the repository default when unset
    #[serde(default)]
    pub branch: Option<String>,
}

impl Repo {
    /// Create a repository reference without an explicit branch
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            branch: None,
        }
    }

    /// Set the branch
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Full project path, `owner/name`, or just `name` without an owner
    pub fn path(&self) -> String {
        if self.owner.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.owner, self.name)
        }
    }

    /// Explicit, non-empty branch if one was given
    pub fn explicit_branch(&self) -> Option<&str> {
        self.branch.as_deref().filter(|b| !b.is_empty())
    }
}

impl fmt::Display for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Author attached to commits made on the caller's behalf
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAuthor {
    /// Author name
    pub name: String,
    /// Author email
    #[serde(default)]
    pub email: String,
}

impl CommitAuthor {
    /// Create a new commit author
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Fields used when a release has to be created
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRelease {
    /// Tag the release is attached to
    pub tag: String,
    /// Release title; defaults to the tag
    pub name: Option<String>,
    /// Release notes
    #[serde(default)]
    pub description: String,
    /// Commit or branch to create the tag from when it does not exist yet
    pub reference: Option<String>,
    /// Package version used for registry uploads; defaults to the tag
    pub version: Option<String>,
}

impl NewRelease {
    /// Create a release request for a tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Set the release title
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the release notes
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the ref the tag is created from
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Set the package version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Title to use, falling back to the tag
    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.tag)
    }
}

/// A release that exists on the hosting service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseHandle {
    /// Repository the release belongs to
    pub repo: Repo,
    /// Tag the release is attached to; the service's identifier for it
    pub tag: String,
    /// Release title
    pub name: String,
    /// Release notes as stored by the service
    pub description: String,
    /// Package version for registry uploads
    pub version: String,
    /// When the service created the release
    pub created_at: Option<DateTime<Utc>>,
}

/// Link between a release and an uploaded asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetLink {
    /// Service-assigned link identifier
    pub id: u64,
    /// Display name
    pub name: String,
    /// Download URL
    pub url: String,
}

/// A build artifact to attach to a release.
///
/// The content is consumed by the upload and not retained.
pub struct Artifact {
    /// Display name, also used as the file name
    pub name: String,
    content: Pin<Box<dyn AsyncRead + Send>>,
}

impl Artifact {
    /// Create an artifact from any async reader
    pub fn new(name: impl Into<String>, content: impl AsyncRead + Send + 'static) -> Self {
        Self {
            name: name.into(),
            content: Box::pin(content),
        }
    }

    /// Create an artifact from in-memory bytes
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(name, std::io::Cursor::new(bytes.into()))
    }

    /// Open a file on disk as an artifact
    pub async fn open(name: impl Into<String>, path: &std::path::Path) -> std::io::Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        Ok(Self::new(name, file))
    }

    /// Read the whole content, consuming the artifact
    pub async fn into_bytes(mut self) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.content.read_to_end(&mut buf).await?;
        Ok(buf)
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
