//! Scripted process runner for workflow tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use release_bot::error::Result;
use release_bot::process::{render_command, CommandOutput, ProcessRunner};

pub const FAKE_SHA: &str = "0123456789abcdef0123456789abcdef01234567";

/// Records every command line and answers from a script.
///
/// Scripted responses match on a command-line prefix; the first matching
/// entry wins. A sequence is consumed front to back and its last response
/// repeats. `git clone` creates the target directory so workspace cleanup
/// can be observed on disk.
///
/// Unscripted commands succeed with empty output, except that
/// `git status --porcelain` reports a modified changelog and `git log`
/// prints a commit sha.
pub struct FakeRunner {
    commands: Mutex<Vec<String>>,
    script: Mutex<Vec<(String, VecDeque<CommandOutput>)>>,
}

impl Default for FakeRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            script: Mutex::new(Vec::new()),
        }
    }

    /// Answer commands starting with `prefix` with `responses` in order
    pub fn respond(&self, prefix: &str, responses: Vec<CommandOutput>) {
        self.script
            .lock()
            .unwrap()
            .push((prefix.to_string(), responses.into()));
    }

    /// Make commands starting with `prefix` exit non-zero
    pub fn fail_on(&self, prefix: &str, stderr: &str) {
        self.respond(prefix, vec![failed(stderr)]);
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.commands()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }

    fn scripted(&self, line: &str) -> Option<CommandOutput> {
        let mut script = self.script.lock().unwrap();
        let (_, responses) = script
            .iter_mut()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))?;
        if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        }
    }
}

#[async_trait]
impl ProcessRunner for FakeRunner {
    async fn run(&self, _dir: &Path, program: &str, args: &[String]) -> Result<CommandOutput> {
        let line = render_command(program, args);
        self.commands.lock().unwrap().push(line.clone());

        if let Some(output) = self.scripted(&line) {
            return Ok(output);
        }

        if line.starts_with("git clone") {
            if let Some(target) = args.last() {
                std::fs::create_dir_all(target)?;
            }
        }

        let stdout = if line.starts_with("git status --porcelain") {
            " M CHANGELOG.md\n".to_string()
        } else if line.starts_with("git log") {
            format!("{FAKE_SHA}\n")
        } else {
            String::new()
        };
        Ok(ok(&stdout))
    }
}

pub fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn failed(stderr: &str) -> CommandOutput {
    CommandOutput {
        code: Some(1),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}
