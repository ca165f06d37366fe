use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use crate::config::WorkspaceConfig;
use crate::error::{AppError, Result};
use crate::process::{render_command, CommandOutput, ProcessRunner};

const RUN_DIR_PREFIX: &str = "run-";

/// Allocates per-run workspace directories under a common base directory.
pub struct WorkspaceManager {
    base_dir: PathBuf,
    keep_on_failure: bool,
    runner: Arc<dyn ProcessRunner>,
}

/// An ephemeral local clone owned by exactly one pipeline run.
pub struct Workspace {
    pub id: Uuid,
    pub path: PathBuf,
    pub cloned: bool,
    base_dir: PathBuf,
    runner: Arc<dyn ProcessRunner>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("cloned", &self.cloned)
            .finish()
    }
}

impl WorkspaceManager {
    pub fn new(config: &WorkspaceConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            base_dir: config.base_dir.clone(),
            keep_on_failure: config.keep_on_failure,
            runner,
        }
    }

    /// Whether failed runs leave their clone on disk.
    pub fn keep_on_failure(&self) -> bool {
        self.keep_on_failure
    }

    /// Reserve a fresh, uniquely named workspace. Nothing is created on disk yet.
    pub fn create(&self) -> Workspace {
        let id = Uuid::new_v4();
        Workspace {
            id,
            path: self.base_dir.join(format!("{RUN_DIR_PREFIX}{id}")),
            cloned: false,
            base_dir: self.base_dir.clone(),
            runner: Arc::clone(&self.runner),
        }
    }

    /// Remove leftover run directories, e.g. from runs cut short by shutdown.
    ///
    /// Returns the number of directories removed.
    pub async fn sweep(&self) -> usize {
        let mut entries = match tokio::fs::read_dir(&self.base_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
            Err(e) => {
                tracing::warn!(dir = %self.base_dir.display(), error = %e, "Failed to read workspace dir");
                return 0;
            }
        };

        let mut removed = 0;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let is_run_dir = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(RUN_DIR_PREFIX));
            if !is_run_dir {
                continue;
            }
            match tokio::fs::remove_dir_all(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(
                    path = %entry.path().display(),
                    error = %e,
                    "Failed to remove leftover workspace"
                ),
            }
        }
        removed
    }
}

impl Workspace {
    /// Clone `remote_url` into the workspace directory.
    pub async fn clone_from(&mut self, remote_url: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.base_dir).await?;

        let args = vec![
            "clone".to_string(),
            "--".to_string(),
            remote_url.to_string(),
            self.path.to_string_lossy().into_owned(),
        ];
        let output = self.runner.run(&self.base_dir, "git", &args).await?;
        if !output.success() {
            return Err(AppError::Clone {
                code: output.code,
                stderr: output.stderr,
            });
        }

        self.cloned = true;
        tracing::info!(workspace = %self.id, path = %self.path.display(), "Cloned repository");
        Ok(())
    }

    /// Run a command with the workspace as working directory.
    pub async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let output = self.runner.run(&self.path, program, &args).await?;
        if !output.success() {
            return Err(AppError::Command {
                command: render_command(program, &args),
                code: output.code,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the workspace directory. Safe to call more than once; failures
    /// are logged and never returned.
    pub async fn destroy(&self) {
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {
                tracing::info!(workspace = %self.id, "Removed workspace");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                let err = AppError::Cleanup(format!("{}: {e}", self.path.display()));
                tracing::warn!(workspace = %self.id, error = %err, "Workspace cleanup failed");
            }
        }
    }
}
