//! Changelog regeneration for the release branch.
//!
//! The generator does not reliably reach a fixed point against its own output
//! in one pass, so it runs twice and the two results are folded into a single
//! commit. The externally visible result is one new changelog commit on the
//! branch reflecting both passes.
//!
//! The sequence is not transactional: when a later command fails, pushes that
//! already happened stay on the remote.

use crate::error::Result;
use crate::workspace::{git, Workspace};

/// Generator invocation and the file it writes.
#[derive(Debug, Clone)]
pub struct ChangelogSettings {
    /// Program followed by its arguments.
    pub argv: Vec<String>,
    pub file: String,
    pub commit_message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangelogOutcome {
    /// The generator produced no change; nothing was committed.
    Unchanged,
    /// One pass changed the file; the second pass agreed with it.
    Committed,
    /// The second pass changed the file again and was folded into one commit.
    Folded,
}

/// Regenerate the changelog on `branch` and push the result.
pub async fn regenerate(
    ws: &Workspace,
    branch: &str,
    settings: &ChangelogSettings,
) -> Result<ChangelogOutcome> {
    generate(ws, settings).await?;
    if !git::has_changes(ws, &settings.file).await? {
        tracing::info!(workspace = %ws.id, "Changelog already up to date");
        return Ok(ChangelogOutcome::Unchanged);
    }

    git::add(ws, &settings.file).await?;
    git::commit(ws, &settings.commit_message).await?;
    git::push(ws, branch).await?;

    generate(ws, settings).await?;
    if !git::has_changes(ws, &settings.file).await? {
        tracing::info!(workspace = %ws.id, "Second changelog pass made no changes");
        return Ok(ChangelogOutcome::Committed);
    }

    // Replace the first changelog commit with one holding the second pass
    let parent = git::commit_sha(ws, "HEAD~1").await?;
    git::reset(ws, &parent).await?;
    git::add(ws, &settings.file).await?;
    git::commit(ws, &settings.commit_message).await?;
    git::force_push(ws, branch).await?;

    tracing::info!(workspace = %ws.id, parent = %parent, "Folded changelog passes into one commit");
    Ok(ChangelogOutcome::Folded)
}

async fn generate(ws: &Workspace, settings: &ChangelogSettings) -> Result<()> {
    let (program, args) = match settings.argv.split_first() {
        Some(split) => split,
        None => {
            return Err(crate::error::AppError::Config(
                "Changelog command is empty".to_string(),
            ))
        }
    };
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    ws.run(program, &args).await?;
    Ok(())
}
