//! Sequential step runner shared by the release workflows.
//!
//! A [`Pipeline`] owns an ordered list of [`Step`]s over a run state `S`.
//! Steps run strictly in order; the first fatal failure stops the run. The
//! optional [`Finalizer`] runs exactly once afterwards whatever happened. Then
//! exactly one notification (success or the failing step's message) is sent,
//! bounded by the notification timeout so a stuck sink cannot hold the run.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::notify::NotificationSink;

/// Why a step failed, with the message the operator sees.
#[derive(Debug)]
pub struct Failure {
    pub step: String,
    pub user_message: String,
    pub cause: AppError,
}

impl Failure {
    pub fn new(step: &str, user_message: impl Into<String>, cause: AppError) -> Self {
        Self {
            step: step.to_string(),
            user_message: user_message.into(),
            cause,
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "step `{}` failed: {}", self.step, self.cause)
    }
}

/// Attach step context to a fallible call.
pub trait StepResultExt<T> {
    /// Turn an error into a [`Failure`] whose user message is
    /// `"{context}: {cause summary}"`.
    fn or_fail(self, step: &str, context: &str) -> Result<T, Failure>;
}

impl<T> StepResultExt<T> for crate::error::Result<T> {
    fn or_fail(self, step: &str, context: &str) -> Result<T, Failure> {
        self.map_err(|cause| {
            let message = format!("{context}: {}", cause.summary());
            Failure::new(step, message, cause)
        })
    }
}

#[async_trait]
pub trait Step<S: Send>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Non-fatal steps log their failure and let the run continue.
    fn fatal(&self) -> bool {
        true
    }

    async fn run(&self, state: &mut S) -> Result<(), Failure>;
}

/// Terminal action that runs once per run, after the steps.
#[async_trait]
pub trait Finalizer<S: Send>: Send + Sync {
    /// `failed` tells whether a fatal step failure ended the run. Errors are
    /// logged by the runner and never replace the run's outcome.
    async fn finalize(&self, state: &mut S, failed: bool) -> crate::error::Result<()>;
}

/// Final state of a run and its fatal failure, if any.
#[derive(Debug)]
pub struct RunReport<S> {
    pub run_id: Uuid,
    pub state: S,
    pub failure: Option<Failure>,
}

impl<S> RunReport<S> {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

type SuccessMessage<S> = Box<dyn Fn(&S) -> String + Send + Sync>;

const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Pipeline<S: Send> {
    name: &'static str,
    steps: Vec<Box<dyn Step<S>>>,
    finalizer: Option<Box<dyn Finalizer<S>>>,
    sink: Arc<dyn NotificationSink>,
    notify_timeout: Duration,
    success_message: SuccessMessage<S>,
}

impl<S: Send> Pipeline<S> {
    pub fn new<F>(name: &'static str, sink: Arc<dyn NotificationSink>, success_message: F) -> Self
    where
        F: Fn(&S) -> String + Send + Sync + 'static,
    {
        Self {
            name,
            steps: Vec::new(),
            finalizer: None,
            sink,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
            success_message: Box::new(success_message),
        }
    }

    pub fn step(mut self, step: impl Step<S> + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn finalizer(mut self, finalizer: impl Finalizer<S> + 'static) -> Self {
        self.finalizer = Some(Box::new(finalizer));
        self
    }

    pub fn notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub async fn run(self, mut state: S) -> RunReport<S> {
        let run_id = Uuid::new_v4();
        tracing::info!(
            pipeline = self.name,
            run = %run_id,
            steps = self.steps.len(),
            "Starting pipeline"
        );

        let mut failure = None;
        for step in &self.steps {
            tracing::info!(pipeline = self.name, run = %run_id, step = step.name(), "Running step");

            match step.run(&mut state).await {
                Ok(()) => {}
                Err(f) if !step.fatal() => {
                    tracing::warn!(
                        pipeline = self.name,
                        run = %run_id,
                        step = step.name(),
                        error = %f.cause,
                        "Non-fatal step failed, continuing"
                    );
                }
                Err(f) => {
                    tracing::error!(
                        pipeline = self.name,
                        run = %run_id,
                        step = step.name(),
                        error = %f.cause,
                        "Step failed, halting pipeline"
                    );
                    failure = Some(f);
                    break;
                }
            }
        }

        if let Some(ref finalizer) = self.finalizer {
            if let Err(e) = finalizer.finalize(&mut state, failure.is_some()).await {
                tracing::warn!(pipeline = self.name, run = %run_id, error = %e, "Finalizer failed");
            }
        }

        let message = match failure {
            Some(ref f) => f.user_message.clone(),
            None => (self.success_message)(&state),
        };
        match tokio::time::timeout(self.notify_timeout, self.sink.notify(&message)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(pipeline = self.name, run = %run_id, error = %e, "Failed to deliver notification");
            }
            Err(_) => {
                let e = AppError::Timeout {
                    operation: "deliver notification".to_string(),
                    after: self.notify_timeout,
                };
                tracing::warn!(pipeline = self.name, run = %run_id, error = %e, "Failed to deliver notification");
            }
        }

        tracing::info!(
            pipeline = self.name,
            run = %run_id,
            succeeded = failure.is_none(),
            "Pipeline finished"
        );

        RunReport {
            run_id,
            state,
            failure,
        }
    }
}
