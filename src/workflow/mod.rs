pub mod merge;
pub mod prepare_next;
mod tracker;
pub mod types;

use std::sync::Arc;

use crate::command::Command;
use crate::config::{AppConfig, ReleaseConfig};
use crate::host::RemoteHost;
use crate::notify::NotificationSink;
use crate::process::ProcessRunner;
use crate::workspace::WorkspaceManager;
pub use tracker::RunTracker;
use types::WorkflowOutcome;

/// Everything a workflow run needs, built once at startup and shared by runs.
pub struct ReleaseContext {
    pub host: Arc<dyn RemoteHost>,
    pub sink: Arc<dyn NotificationSink>,
    pub workspaces: WorkspaceManager,
    pub owner: String,
    pub repo: String,
    pub remote_url: String,
    pub release: ReleaseConfig,
}

impl ReleaseContext {
    pub fn from_config(
        config: &AppConfig,
        host: Arc<dyn RemoteHost>,
        runner: Arc<dyn ProcessRunner>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            host,
            sink,
            workspaces: WorkspaceManager::new(&config.workspace, runner),
            owner: config.github.owner.clone(),
            repo: config.github.repo.clone(),
            remote_url: config.github.ssh_remote_url(),
            release: config.release.clone(),
        }
    }
}

/// Run the workflow for an operator command to completion.
pub async fn execute(ctx: Arc<ReleaseContext>, command: Command) -> WorkflowOutcome {
    tracing::info!(command = %command, owner = %ctx.owner, repo = %ctx.repo, "Executing command");

    let outcome = match command {
        Command::Merge { number } => merge::run(ctx, number).await,
        Command::PrepareNext => prepare_next::run(ctx).await,
    };

    match outcome {
        WorkflowOutcome::Failed {
            ref step,
            ref error,
        } => {
            tracing::error!(command = %command, step = %step, error = %error, "Command failed");
        }
        ref done => {
            tracing::info!(command = %command, outcome = ?done, "Command completed");
        }
    }

    outcome
}
