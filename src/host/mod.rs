pub mod github;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use types::*;

/// Pull-request and issue operations against the remote repository host.
///
/// Constructed once at startup and shared by every pipeline run.
#[async_trait]
pub trait RemoteHost: Send + Sync {
    /// List every open pull request whose head is `head_branch`.
    ///
    /// Pages are followed until the result set is complete.
    async fn list_open_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        head_branch: &str,
    ) -> Result<Vec<PullRequestRef>>;

    /// Open a pull request. Fails with `Conflict` when one already exists
    /// for the same head and base.
    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pr: &CreatePullRequest,
    ) -> Result<PullRequestRef>;

    /// Fetch a pull request. Fails with `NotFound` for unknown numbers.
    async fn get_pull_request(&self, owner: &str, repo: &str, number: u64)
        -> Result<PullRequestRef>;

    /// Merge a pull request. Fails with `MergeConflict` when the host refuses.
    async fn merge_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        method: MergeMethod,
    ) -> Result<()>;

    /// Add labels to an issue or PR. Existing labels are kept.
    async fn add_labels(&self, owner: &str, repo: &str, number: u64, labels: &[String])
        -> Result<()>;

    /// Post a comment on an issue or PR.
    async fn add_comment(&self, owner: &str, repo: &str, number: u64, body: &str) -> Result<()>;
}
