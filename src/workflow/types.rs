/// Outcome of a workflow execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    /// The pull request was squash-merged into the release branch.
    Merged { pr_number: u64 },
    /// The release branch was rebased, its changelog regenerated and its PR frozen.
    NextPrepared { pr_number: u64 },
    /// A step failed; the operator has been notified.
    Failed { step: String, error: String },
}

impl WorkflowOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, WorkflowOutcome::Failed { .. })
    }
}
