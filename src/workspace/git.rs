use crate::error::{AppError, Result};
use crate::workspace::Workspace;

const BOT_NAME: &str = "user.name=Release Bot";
const BOT_EMAIL: &str = "user.email=release-bot@users.noreply.github.com";

/// Validate a branch name to prevent argument injection.
/// Rejects names starting with `-` as defence in depth.
fn validate_branch_name(name: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('-') {
        return Err(AppError::Config(format!("Invalid branch name: {name:?}")));
    }
    Ok(())
}

/// Checkout an existing branch.
pub async fn checkout(ws: &Workspace, branch: &str) -> Result<()> {
    validate_branch_name(branch)?;
    ws.run("git", &["checkout", branch]).await?;
    Ok(())
}

/// Rebase the current branch onto `upstream`. Rewritten commits are
/// committed as the bot identity.
pub async fn rebase(ws: &Workspace, upstream: &str) -> Result<()> {
    validate_branch_name(upstream)?;
    ws.run("git", &["-c", BOT_NAME, "-c", BOT_EMAIL, "rebase", upstream])
        .await?;
    Ok(())
}

/// Push a branch to origin.
pub async fn push(ws: &Workspace, branch: &str) -> Result<()> {
    validate_branch_name(branch)?;
    ws.run("git", &["push", "origin", branch]).await?;
    Ok(())
}

/// Push with force, overwriting the remote branch after a history rewrite.
pub async fn force_push(ws: &Workspace, branch: &str) -> Result<()> {
    validate_branch_name(branch)?;
    ws.run("git", &["push", "--force", "origin", branch]).await?;
    Ok(())
}

/// Stage a single path.
pub async fn add(ws: &Workspace, path: &str) -> Result<()> {
    ws.run("git", &["add", "--", path]).await?;
    Ok(())
}

/// Commit staged changes as the bot identity.
pub async fn commit(ws: &Workspace, message: &str) -> Result<()> {
    ws.run("git", &["-c", BOT_NAME, "-c", BOT_EMAIL, "commit", "-m", message])
        .await?;
    Ok(())
}

/// Resolve a revision to its full commit sha.
pub async fn commit_sha(ws: &Workspace, rev: &str) -> Result<String> {
    let output = ws.run("git", &["log", "-1", "--format=%H", rev]).await?;
    let sha = output.stdout.trim().to_string();
    if sha.is_empty() {
        return Err(AppError::Command {
            command: format!("git log -1 --format=%H {rev}"),
            code: output.code,
            stderr: "no commit found".to_string(),
        });
    }
    Ok(sha)
}

/// Move the branch tip to `sha`, keeping the working tree.
pub async fn reset(ws: &Workspace, sha: &str) -> Result<()> {
    ws.run("git", &["reset", sha]).await?;
    Ok(())
}

/// Check whether `path` has staged or unstaged changes.
pub async fn has_changes(ws: &Workspace, path: &str) -> Result<bool> {
    let output = ws.run("git", &["status", "--porcelain", "--", path]).await?;
    Ok(!output.stdout.trim().is_empty())
}
