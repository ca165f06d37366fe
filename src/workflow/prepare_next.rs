//! "prepare next": bring the release branch up to date with the base branch,
//! regenerate its changelog and freeze its pull request.
//!
//! The `next` branch is rebased and force-pushed, so it must only ever be
//! written by this workflow. Concurrent runs are not serialized and can
//! interleave force-pushes.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::host::types::CreatePullRequest;
use crate::pipeline::{Failure, Finalizer, Pipeline, Step, StepResultExt};
use crate::workflow::types::WorkflowOutcome;
use crate::workflow::ReleaseContext;
use crate::workspace::changelog::{self, ChangelogSettings};
use crate::workspace::{git, Workspace};

/// Labels applied to the release pull request once it is prepared.
pub const FREEZE_LABELS: [&str; 2] = ["Frozen", "Needs Canary"];

const CHANGELOG_COMMIT_MESSAGE: &str = "Update changelog";

#[derive(Debug, Default)]
pub struct PrepareNextState {
    pub pull_request: Option<u64>,
    pub workspace: Option<Workspace>,
}

impl PrepareNextState {
    fn workspace(&self, step: &str) -> std::result::Result<&Workspace, Failure> {
        self.workspace.as_ref().ok_or_else(|| {
            Failure::new(
                step,
                "No workspace available",
                AppError::Internal(format!("{step} ran before the repository was cloned")),
            )
        })
    }
}

/// Build the prepare-next pipeline.
pub fn pipeline(ctx: Arc<ReleaseContext>) -> Pipeline<PrepareNextState> {
    let next = ctx.release.next_branch.clone();
    Pipeline::new("prepare_next", Arc::clone(&ctx.sink), move |state: &PrepareNextState| {
        match state.pull_request {
            Some(number) => format!(
                "`{next}` is ready: rebased, changelog regenerated, #{number} labeled {}",
                FREEZE_LABELS.join(", ")
            ),
            None => format!("`{next}` is ready"),
        }
    })
    .step(FindOpenPr(Arc::clone(&ctx)))
    .step(EnsurePrOpen(Arc::clone(&ctx)))
    .step(CloneRepo(Arc::clone(&ctx)))
    .step(CheckoutNext(Arc::clone(&ctx)))
    .step(SyncWithBase(Arc::clone(&ctx)))
    .step(RegenerateChangelog(Arc::clone(&ctx)))
    .step(LabelPr(Arc::clone(&ctx)))
    .finalizer(DestroyWorkspace(ctx))
}

pub async fn run(ctx: Arc<ReleaseContext>) -> WorkflowOutcome {
    let report = pipeline(ctx).run(PrepareNextState::default()).await;

    match (report.failure, report.state.pull_request) {
        (Some(failure), _) => WorkflowOutcome::Failed {
            step: failure.step,
            error: failure.cause.to_string(),
        },
        (None, Some(pr_number)) => WorkflowOutcome::NextPrepared { pr_number },
        (None, None) => WorkflowOutcome::Failed {
            step: "label_pr".to_string(),
            error: "Finished without a pull request".to_string(),
        },
    }
}

struct FindOpenPr(Arc<ReleaseContext>);

#[async_trait]
impl Step<PrepareNextState> for FindOpenPr {
    fn name(&self) -> &'static str {
        "find_open_pr"
    }

    async fn run(&self, state: &mut PrepareNextState) -> std::result::Result<(), Failure> {
        let ctx = &self.0;
        let next = &ctx.release.next_branch;
        let open = ctx
            .host
            .list_open_pull_requests(&ctx.owner, &ctx.repo, next)
            .await
            .or_fail(self.name(), "Could not list open pull requests")?;

        match open.as_slice() {
            [] => {
                tracing::info!(branch = %next, "No open release pull request");
                state.pull_request = None;
            }
            [pr] => {
                tracing::info!(branch = %next, pr = pr.number, "Found open release pull request");
                state.pull_request = Some(pr.number);
            }
            many => {
                let numbers = many
                    .iter()
                    .map(|pr| format!("#{}", pr.number))
                    .collect::<Vec<_>>()
                    .join(", ");
                let message = format!(
                    "Found {} open pull requests from `{next}` ({numbers}); close all but one and try again",
                    many.len()
                );
                return Err(Failure::new(
                    self.name(),
                    message,
                    AppError::AmbiguousState(format!("open pull requests from {next}: {numbers}")),
                ));
            }
        }
        Ok(())
    }
}

struct EnsurePrOpen(Arc<ReleaseContext>);

#[async_trait]
impl Step<PrepareNextState> for EnsurePrOpen {
    fn name(&self) -> &'static str {
        "ensure_pr_open"
    }

    async fn run(&self, state: &mut PrepareNextState) -> std::result::Result<(), Failure> {
        if state.pull_request.is_some() {
            return Ok(());
        }

        let ctx = &self.0;
        let request = CreatePullRequest {
            title: ctx.release.next_branch.clone(),
            head_branch: ctx.release.next_branch.clone(),
            base_branch: ctx.release.base_branch.clone(),
            maintainer_can_modify: true,
        };
        let created = ctx
            .host
            .create_pull_request(&ctx.owner, &ctx.repo, &request)
            .await
            .or_fail(self.name(), "Could not open the release pull request")?;

        tracing::info!(pr = created.number, "Opened release pull request");
        state.pull_request = Some(created.number);
        Ok(())
    }
}

struct CloneRepo(Arc<ReleaseContext>);

#[async_trait]
impl Step<PrepareNextState> for CloneRepo {
    fn name(&self) -> &'static str {
        "clone_repo"
    }

    async fn run(&self, state: &mut PrepareNextState) -> std::result::Result<(), Failure> {
        let ctx = &self.0;
        // Record the workspace before cloning so a partial clone is still cleaned up
        let workspace = state.workspace.insert(ctx.workspaces.create());
        workspace
            .clone_from(&ctx.remote_url)
            .await
            .or_fail(self.name(), "Could not clone the repository")
    }
}

struct CheckoutNext(Arc<ReleaseContext>);

#[async_trait]
impl Step<PrepareNextState> for CheckoutNext {
    fn name(&self) -> &'static str {
        "checkout_next"
    }

    async fn run(&self, state: &mut PrepareNextState) -> std::result::Result<(), Failure> {
        let next = &self.0.release.next_branch;
        let ws = state.workspace(self.name())?;
        git::checkout(ws, next)
            .await
            .or_fail(self.name(), &format!("Could not check out `{next}`"))
    }
}

struct SyncWithBase(Arc<ReleaseContext>);

impl SyncWithBase {
    async fn sync(&self, ws: &Workspace) -> Result<()> {
        let release = &self.0.release;
        // A fresh clone only has a local branch for the remote's default branch
        git::rebase(ws, &format!("origin/{}", release.base_branch)).await?;
        git::force_push(ws, &release.next_branch).await
    }
}

#[async_trait]
impl Step<PrepareNextState> for SyncWithBase {
    fn name(&self) -> &'static str {
        "sync_with_master"
    }

    async fn run(&self, state: &mut PrepareNextState) -> std::result::Result<(), Failure> {
        let release = &self.0.release;
        let ws = state.workspace(self.name())?;
        self.sync(ws).await.or_fail(
            self.name(),
            &format!(
                "Could not rebase `{}` onto `{}`",
                release.next_branch, release.base_branch
            ),
        )
    }
}

struct RegenerateChangelog(Arc<ReleaseContext>);

#[async_trait]
impl Step<PrepareNextState> for RegenerateChangelog {
    fn name(&self) -> &'static str {
        "regenerate_changelog"
    }

    async fn run(&self, state: &mut PrepareNextState) -> std::result::Result<(), Failure> {
        let ctx = &self.0;
        let ws = state.workspace(self.name())?;
        let context = "Could not regenerate the changelog";

        let settings = ChangelogSettings {
            argv: ctx
                .release
                .changelog_argv(&ctx.owner, &ctx.repo)
                .or_fail(self.name(), context)?,
            file: ctx.release.changelog_file.clone(),
            commit_message: CHANGELOG_COMMIT_MESSAGE.to_string(),
        };

        let outcome = changelog::regenerate(ws, &ctx.release.next_branch, &settings)
            .await
            .or_fail(self.name(), context)?;
        tracing::info!(outcome = ?outcome, "Changelog regenerated");
        Ok(())
    }
}

struct LabelPr(Arc<ReleaseContext>);

#[async_trait]
impl Step<PrepareNextState> for LabelPr {
    fn name(&self) -> &'static str {
        "label_pr"
    }

    async fn run(&self, state: &mut PrepareNextState) -> std::result::Result<(), Failure> {
        let ctx = &self.0;
        let number = state.pull_request.ok_or_else(|| {
            Failure::new(
                self.name(),
                "No release pull request to label",
                AppError::Internal("label_pr ran without a pull request".to_string()),
            )
        })?;

        let labels: Vec<String> = FREEZE_LABELS.iter().map(|l| l.to_string()).collect();
        ctx.host
            .add_labels(&ctx.owner, &ctx.repo, number, &labels)
            .await
            .or_fail(self.name(), &format!("Could not label #{number}"))
    }
}

struct DestroyWorkspace(Arc<ReleaseContext>);

#[async_trait]
impl Finalizer<PrepareNextState> for DestroyWorkspace {
    async fn finalize(&self, state: &mut PrepareNextState, failed: bool) -> Result<()> {
        let Some(ref ws) = state.workspace else {
            return Ok(());
        };

        if failed && self.0.workspaces.keep_on_failure() {
            tracing::info!(
                workspace = %ws.id,
                path = %ws.path().display(),
                "Keeping workspace of failed run for inspection"
            );
            return Ok(());
        }

        ws.destroy().await;
        Ok(())
    }
}
