//! Release host capability trait

use crate::error::HostResult;
use crate::types::*;

/// Capabilities a hosting service backend provides to the release pipeline.
///
/// Each backend implements the whole set independently; callers hold a
/// `dyn ReleaseHost` and never branch on the backend kind.
#[async_trait::async_trait]
pub trait ReleaseHost: Send + Sync {
    /// Get the host name
    fn name(&self) -> &str;

    /// Get the host type
    fn host_type(&self) -> HostType;

    /// Return the release for `release.tag`, creating it if it does not exist.
    ///
    /// Safe to call repeatedly: a second call returns the release the first
    /// one created.
    async fn get_or_create_release(
        &self,
        repo: &Repo,
        release: &NewRelease,
    ) -> HostResult<ReleaseHandle>;

    /// Upload an artifact and link it to the release
    async fn upload_asset(&self, release: &ReleaseHandle, artifact: Artifact)
        -> HostResult<AssetLink>;

    /// Commit `content` to `path`, creating or updating the file
    async fn create_file(
        &self,
        author: &CommitAuthor,
        repo: &Repo,
        content: &[u8],
        path: &str,
        message: &str,
    ) -> HostResult<()>;

    /// Render the commits between two refs, one line per non-merge commit
    async fn changelog(&self, repo: &Repo, from: &str, to: &str) -> HostResult<String>;

    /// Close the milestone whose title equals `title`
    async fn close_milestone(&self, repo: &Repo, title: &str) -> HostResult<()>;

    /// Default branch configured for the repository
    async fn default_branch(&self, repo: &Repo) -> HostResult<String>;
}
