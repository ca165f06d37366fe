//! Shared fixtures for workflow tests

#![allow(dead_code)]

pub mod fake_runner;
pub mod mock_host;

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use release_bot::config::{ReleaseConfig, WorkspaceConfig};
use release_bot::error::{AppError, Result};
use release_bot::notify::NotificationSink;
use release_bot::process::ProcessRunner;
use release_bot::workflow::ReleaseContext;

pub use fake_runner::{failed, ok, FakeRunner, FAKE_SHA};
pub use mock_host::{make_pr, MockHost};

pub const OWNER: &str = "acme";
pub const REPO: &str = "widgets";
pub const REMOTE_URL: &str = "git@github.com:acme/widgets.git";

/// Collects notifications instead of sending them.
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingSink {
    /// A sink whose deliveries always fail after recording the message
    pub fn failing() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, message: &str) -> Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.fail {
            return Err(AppError::Transport("chat service unavailable".to_string()));
        }
        Ok(())
    }
}

/// Builder for a `ReleaseContext` wired to test doubles.
pub struct Harness {
    pub host: Arc<MockHost>,
    pub sink: Arc<RecordingSink>,
    pub remote_url: String,
    pub release: ReleaseConfig,
    pub workspace: WorkspaceConfig,
}

impl Harness {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            host: Arc::new(MockHost::new()),
            sink: Arc::new(RecordingSink::default()),
            remote_url: REMOTE_URL.to_string(),
            release: ReleaseConfig::default(),
            workspace: WorkspaceConfig {
                base_dir: base_dir.to_path_buf(),
                ..WorkspaceConfig::default()
            },
        }
    }

    pub fn keep_on_failure(mut self) -> Self {
        self.workspace.keep_on_failure = true;
        self
    }

    pub fn context(&self, runner: Arc<dyn ProcessRunner>) -> Arc<ReleaseContext> {
        Arc::new(ReleaseContext {
            host: self.host.clone(),
            sink: self.sink.clone(),
            workspaces: release_bot::workspace::WorkspaceManager::new(&self.workspace, runner),
            owner: OWNER.to_string(),
            repo: REPO.to_string(),
            remote_url: self.remote_url.clone(),
            release: self.release.clone(),
        })
    }
}

/// Names of the run directories currently under `base_dir`.
pub fn run_dirs(base_dir: &Path) -> Vec<String> {
    match std::fs::read_dir(base_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|name| name.starts_with("run-"))
            .collect(),
        Err(_) => Vec::new(),
    }
}
