//! Mock repository host for workflow tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use release_bot::error::{AppError, Result};
use release_bot::host::types::{CreatePullRequest, MergeMethod, PrState, PullRequestRef};
use release_bot::host::RemoteHost;

/// Call record for `create_pull_request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePrCall {
    pub title: String,
    pub head: String,
    pub base: String,
    pub maintainer_can_modify: bool,
}

/// Call record for `add_labels`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCall {
    pub number: u64,
    pub labels: Vec<String>,
}

/// Call record for `add_comment`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentCall {
    pub number: u64,
    pub body: String,
}

/// Hand-written `RemoteHost` with call tracking and error injection.
///
/// Created pull requests are numbered from 100 upwards.
pub struct MockHost {
    next_pr_number: AtomicU64,
    open_prs: Mutex<Vec<PullRequestRef>>,
    pull_requests: Mutex<HashMap<u64, PullRequestRef>>,
    // Call tracking
    list_calls: Mutex<Vec<String>>,
    create_calls: Mutex<Vec<CreatePrCall>>,
    get_calls: Mutex<Vec<u64>>,
    merge_calls: Mutex<Vec<(u64, MergeMethod)>>,
    label_calls: Mutex<Vec<LabelCall>>,
    comment_calls: Mutex<Vec<CommentCall>>,
    // Error injection
    error_on_list: Mutex<Option<String>>,
    error_on_create: Mutex<Option<String>>,
    error_on_merge: Mutex<Option<String>>,
    error_on_label: Mutex<Option<String>>,
    error_on_comment: Mutex<Option<String>>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            next_pr_number: AtomicU64::new(100),
            open_prs: Mutex::new(Vec::new()),
            pull_requests: Mutex::new(HashMap::new()),
            list_calls: Mutex::new(Vec::new()),
            create_calls: Mutex::new(Vec::new()),
            get_calls: Mutex::new(Vec::new()),
            merge_calls: Mutex::new(Vec::new()),
            label_calls: Mutex::new(Vec::new()),
            comment_calls: Mutex::new(Vec::new()),
            error_on_list: Mutex::new(None),
            error_on_create: Mutex::new(None),
            error_on_merge: Mutex::new(None),
            error_on_label: Mutex::new(None),
            error_on_comment: Mutex::new(None),
        }
    }

    // === Responses ===

    /// Set the open pull requests returned for any head branch
    pub fn set_open_prs(&self, prs: Vec<PullRequestRef>) {
        *self.open_prs.lock().unwrap() = prs;
    }

    /// Register a pull request returned by `get_pull_request`
    pub fn add_pull_request(&self, pr: PullRequestRef) {
        self.pull_requests.lock().unwrap().insert(pr.number, pr);
    }

    // === Error injection ===

    pub fn fail_list(&self, msg: &str) {
        *self.error_on_list.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `create_pull_request` fail as if the PR already exists
    pub fn fail_create(&self, msg: &str) {
        *self.error_on_create.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `merge_pull_request` fail with a merge conflict
    pub fn fail_merge(&self, msg: &str) {
        *self.error_on_merge.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_label(&self, msg: &str) {
        *self.error_on_label.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_comment(&self, msg: &str) {
        *self.error_on_comment.lock().unwrap() = Some(msg.to_string());
    }

    // === Call inspection ===

    pub fn list_calls(&self) -> Vec<String> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> Vec<CreatePrCall> {
        self.create_calls.lock().unwrap().clone()
    }

    pub fn get_calls(&self) -> Vec<u64> {
        self.get_calls.lock().unwrap().clone()
    }

    pub fn merge_calls(&self) -> Vec<(u64, MergeMethod)> {
        self.merge_calls.lock().unwrap().clone()
    }

    pub fn label_calls(&self) -> Vec<LabelCall> {
        self.label_calls.lock().unwrap().clone()
    }

    pub fn comment_calls(&self) -> Vec<CommentCall> {
        self.comment_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteHost for MockHost {
    async fn list_open_pull_requests(
        &self,
        _owner: &str,
        _repo: &str,
        head_branch: &str,
    ) -> Result<Vec<PullRequestRef>> {
        self.list_calls.lock().unwrap().push(head_branch.to_string());
        if let Some(msg) = self.error_on_list.lock().unwrap().as_ref() {
            return Err(AppError::Transport(msg.clone()));
        }
        Ok(self.open_prs.lock().unwrap().clone())
    }

    async fn create_pull_request(
        &self,
        _owner: &str,
        _repo: &str,
        pr: &CreatePullRequest,
    ) -> Result<PullRequestRef> {
        self.create_calls.lock().unwrap().push(CreatePrCall {
            title: pr.title.clone(),
            head: pr.head_branch.clone(),
            base: pr.base_branch.clone(),
            maintainer_can_modify: pr.maintainer_can_modify,
        });
        if let Some(msg) = self.error_on_create.lock().unwrap().as_ref() {
            return Err(AppError::Conflict(msg.clone()));
        }

        let created = PullRequestRef {
            number: self.next_pr_number.fetch_add(1, Ordering::SeqCst),
            title: pr.title.clone(),
            head_branch: pr.head_branch.clone(),
            base_branch: pr.base_branch.clone(),
            state: PrState::Open,
        };
        self.pull_requests
            .lock()
            .unwrap()
            .insert(created.number, created.clone());
        Ok(created)
    }

    async fn get_pull_request(
        &self,
        _owner: &str,
        _repo: &str,
        number: u64,
    ) -> Result<PullRequestRef> {
        self.get_calls.lock().unwrap().push(number);
        self.pull_requests
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Not Found".to_string()))
    }

    async fn merge_pull_request(
        &self,
        _owner: &str,
        _repo: &str,
        number: u64,
        method: MergeMethod,
    ) -> Result<()> {
        self.merge_calls.lock().unwrap().push((number, method));
        if let Some(msg) = self.error_on_merge.lock().unwrap().as_ref() {
            return Err(AppError::MergeConflict(msg.clone()));
        }
        if let Some(pr) = self.pull_requests.lock().unwrap().get_mut(&number) {
            pr.state = PrState::Merged;
        }
        Ok(())
    }

    async fn add_labels(
        &self,
        _owner: &str,
        _repo: &str,
        number: u64,
        labels: &[String],
    ) -> Result<()> {
        self.label_calls.lock().unwrap().push(LabelCall {
            number,
            labels: labels.to_vec(),
        });
        if let Some(msg) = self.error_on_label.lock().unwrap().as_ref() {
            return Err(AppError::Transport(msg.clone()));
        }
        Ok(())
    }

    async fn add_comment(&self, _owner: &str, _repo: &str, number: u64, body: &str) -> Result<()> {
        self.comment_calls.lock().unwrap().push(CommentCall {
            number,
            body: body.to_string(),
        });
        if let Some(msg) = self.error_on_comment.lock().unwrap().as_ref() {
            return Err(AppError::Transport(msg.clone()));
        }
        Ok(())
    }
}

pub fn make_pr(number: u64, head: &str, base: &str) -> PullRequestRef {
    PullRequestRef {
        number,
        title: format!("PR {number}"),
        head_branch: head.to_string(),
        base_branch: base.to_string(),
        state: PrState::Open,
    }
}
