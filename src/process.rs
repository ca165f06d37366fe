use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};

/// Exit status and captured output of one external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Executes external programs.
///
/// A non-zero exit is not an error at this level; callers decide. Only a
/// failure to spawn or an expired timeout is returned as `Err`.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, dir: &Path, program: &str, args: &[String]) -> Result<CommandOutput>;
}

/// Runs commands as real child processes via `tokio::process`.
pub struct SystemRunner {
    timeout: Duration,
    envs: Vec<(String, String)>,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            // Never block on a credential prompt
            envs: vec![("GIT_TERMINAL_PROMPT".to_string(), "0".to_string())],
        }
    }

    /// Add an environment variable passed to every command.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, dir: &Path, program: &str, args: &[String]) -> Result<CommandOutput> {
        let command_line = render_command(program, args);
        tracing::debug!(dir = %dir.display(), command = %command_line, "Running command");

        let child = tokio::process::Command::new(program)
            .args(args)
            .current_dir(dir)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| AppError::Timeout {
                operation: command_line.clone(),
                after: self.timeout,
            })??;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Human-readable command line for logs and error messages.
pub fn render_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
