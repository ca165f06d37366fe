use octocrab::models::IssueState;

use crate::error::AppError;
use crate::host::types::{PrState, PullRequestRef};

/// Map an octocrab pull request to our `PullRequestRef`.
pub fn map_pull_request(pr: &octocrab::models::pulls::PullRequest) -> PullRequestRef {
    // IssueState is non-exhaustive; anything that is not open counts as closed
    let state = match pr.state {
        Some(IssueState::Open) => PrState::Open,
        Some(_) if pr.merged_at.is_some() => PrState::Merged,
        _ => PrState::Closed,
    };

    PullRequestRef {
        number: pr.number,
        title: pr.title.clone().unwrap_or_default(),
        head_branch: pr.head.ref_field.clone(),
        base_branch: pr.base.ref_field.clone(),
        state,
    }
}

/// Which API call produced an error. Only a refused merge is a merge conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Merge,
    Other,
}

/// Classify an octocrab error into the error taxonomy pipelines act on.
pub fn classify_error(err: octocrab::Error, call: Call) -> AppError {
    match err {
        octocrab::Error::GitHub { source, .. } => {
            let details: Vec<String> = source
                .errors
                .iter()
                .flatten()
                .filter_map(|e| e.get("message").and_then(|m| m.as_str()))
                .map(str::to_string)
                .collect();
            classify_status(call, source.status_code.as_u16(), &source.message, &details)
        }
        other => AppError::Transport(other.to_string()),
    }
}

/// Map an HTTP status and the host's error payload to an `AppError`.
pub fn classify_status(call: Call, status: u16, message: &str, details: &[String]) -> AppError {
    let message = if details.is_empty() {
        message.to_string()
    } else {
        format!("{message}: {}", details.join("; "))
    };

    match status {
        404 => AppError::NotFound(message),
        405 | 409 if call == Call::Merge => AppError::MergeConflict(message),
        422 if message.contains("already exists") => AppError::Conflict(message),
        _ => AppError::Transport(message),
    }
}
