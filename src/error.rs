use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Command verification failed: {0}")]
    CommandVerification(String),

    #[error("Unrecognized command: {0}")]
    InvalidCommand(String),

    #[error("GitHub API error: {0}")]
    Transport(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Ambiguous state: {0}")]
    AmbiguousState(String),

    #[error("Policy violation: {0}")]
    PolicyViolation(String),

    #[error("Merge refused: {0}")]
    MergeConflict(String),

    #[error("git clone failed (exit {code:?}): {stderr}")]
    Clone { code: Option<i32>, stderr: String },

    #[error("`{command}` failed (exit {code:?}): {stderr}")]
    Command {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("`{operation}` timed out after {after:?}")]
    Timeout {
        operation: String,
        after: std::time::Duration,
    },

    #[error("Workspace cleanup failed: {0}")]
    Cleanup(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<octocrab::Error> for AppError {
    fn from(e: octocrab::Error) -> Self {
        use crate::host::github::mapper::{classify_error, Call};
        classify_error(e, Call::Other)
    }
}

impl AppError {
    /// Short, chat-sized description of the error.
    ///
    /// Remote errors already carry the host's `message` field; process errors
    /// are reduced to the last non-empty stderr line.
    pub fn summary(&self) -> String {
        match self {
            AppError::Transport(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::AmbiguousState(msg)
            | AppError::PolicyViolation(msg)
            | AppError::MergeConflict(msg) => msg.clone(),
            AppError::Clone { code, stderr } => match last_line(stderr) {
                Some(line) => line.to_string(),
                None => format!("git clone exited with {}", exit_label(*code)),
            },
            AppError::Command {
                command,
                code,
                stderr,
            } => match last_line(stderr) {
                Some(line) => format!("`{command}`: {line}"),
                None => format!("`{command}` exited with {}", exit_label(*code)),
            },
            other => other.to_string(),
        }
    }
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).last()
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
