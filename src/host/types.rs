use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrState {
    Open,
    Closed,
    Merged,
}

/// A pull request as seen by one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub number: u64,
    pub title: String,
    pub head_branch: String,
    pub base_branch: String,
    pub state: PrState,
}

#[derive(Debug, Clone)]
pub struct CreatePullRequest {
    pub title: String,
    pub head_branch: String,
    pub base_branch: String,
    pub maintainer_can_modify: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMethod {
    #[default]
    Squash,
    Merge,
    Rebase,
}

impl std::fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeMethod::Squash => write!(f, "squash"),
            MergeMethod::Merge => write!(f, "merge"),
            MergeMethod::Rebase => write!(f, "rebase"),
        }
    }
}
