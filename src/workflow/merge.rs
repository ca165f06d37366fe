//! "merge #N": squash-merge a pull request into the release branch.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppError;
use crate::host::types::{MergeMethod, PrState, PullRequestRef};
use crate::pipeline::{Failure, Pipeline, Step, StepResultExt};
use crate::workflow::types::WorkflowOutcome;
use crate::workflow::ReleaseContext;

#[derive(Debug)]
pub struct MergeState {
    pub number: u64,
    pub pull_request: Option<PullRequestRef>,
}

impl MergeState {
    pub fn new(number: u64) -> Self {
        Self {
            number,
            pull_request: None,
        }
    }
}

/// Build the merge pipeline. No workspace is involved, so there is no finalizer.
pub fn pipeline(ctx: Arc<ReleaseContext>) -> Pipeline<MergeState> {
    let next = ctx.release.next_branch.clone();
    Pipeline::new("merge", Arc::clone(&ctx.sink), move |state: &MergeState| {
        format!("Squash-merged #{} into `{next}`", state.number)
    })
    .step(FetchPr(Arc::clone(&ctx)))
    .step(SquashMerge(Arc::clone(&ctx)))
    .step(CommentAcknowledge(ctx))
}

pub async fn run(ctx: Arc<ReleaseContext>, number: u64) -> WorkflowOutcome {
    let report = pipeline(ctx).run(MergeState::new(number)).await;

    match report.failure {
        Some(failure) => WorkflowOutcome::Failed {
            step: failure.step,
            error: failure.cause.to_string(),
        },
        None => WorkflowOutcome::Merged { pr_number: number },
    }
}

struct FetchPr(Arc<ReleaseContext>);

#[async_trait]
impl Step<MergeState> for FetchPr {
    fn name(&self) -> &'static str {
        "fetch_pr"
    }

    async fn run(&self, state: &mut MergeState) -> Result<(), Failure> {
        let ctx = &self.0;
        let number = state.number;
        let next = &ctx.release.next_branch;

        let pr = ctx
            .host
            .get_pull_request(&ctx.owner, &ctx.repo, number)
            .await
            .or_fail(self.name(), &format!("Could not fetch #{number}"))?;

        if pr.base_branch != *next {
            let message = format!(
                "#{number} targets `{}`; only pull requests into `{next}` can be merged this way",
                pr.base_branch
            );
            return Err(Failure::new(
                self.name(),
                message,
                AppError::PolicyViolation(format!(
                    "#{number} has base {} instead of {next}",
                    pr.base_branch
                )),
            ));
        }

        if pr.state != PrState::Open {
            let status = match pr.state {
                PrState::Merged => "already merged",
                _ => "closed",
            };
            return Err(Failure::new(
                self.name(),
                format!("#{number} is {status}"),
                AppError::PolicyViolation(format!("#{number} is {status}")),
            ));
        }

        tracing::info!(pr = number, title = %pr.title, "Fetched pull request");
        state.pull_request = Some(pr);
        Ok(())
    }
}

struct SquashMerge(Arc<ReleaseContext>);

#[async_trait]
impl Step<MergeState> for SquashMerge {
    fn name(&self) -> &'static str {
        "squash_merge"
    }

    async fn run(&self, state: &mut MergeState) -> Result<(), Failure> {
        let ctx = &self.0;
        let number = state.number;
        ctx.host
            .merge_pull_request(&ctx.owner, &ctx.repo, number, MergeMethod::Squash)
            .await
            .or_fail(self.name(), &format!("Could not merge #{number}"))
    }
}

/// Runs after the merge has landed, so its failure never fails the run.
struct CommentAcknowledge(Arc<ReleaseContext>);

#[async_trait]
impl Step<MergeState> for CommentAcknowledge {
    fn name(&self) -> &'static str {
        "comment_acknowledge"
    }

    fn fatal(&self) -> bool {
        false
    }

    async fn run(&self, state: &mut MergeState) -> Result<(), Failure> {
        let ctx = &self.0;
        let number = state.number;
        let body = format!(
            "Squash-merged into `{}` by release-bot.",
            ctx.release.next_branch
        );
        ctx.host
            .add_comment(&ctx.owner, &ctx.repo, number, &body)
            .await
            .or_fail(self.name(), &format!("Could not comment on #{number}"))
    }
}
