use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinSet;

/// Workflow runs accepted by the server that have not finished yet.
///
/// Shutdown drains the tracker before touching workspaces, so a run is never
/// swept out from under a git command it is still executing.
#[derive(Default)]
pub struct RunTracker {
    runs: Mutex<JoinSet<()>>,
}

impl RunTracker {
    pub async fn spawn<F>(&self, run: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut runs = self.runs.lock().await;
        reap(&mut runs);
        runs.spawn(run);
    }

    pub async fn in_flight(&self) -> usize {
        let mut runs = self.runs.lock().await;
        reap(&mut runs);
        runs.len()
    }

    /// Wait up to `grace` for every run to finish. Runs still going at the
    /// deadline are aborted; their count is returned.
    pub async fn drain(&self, grace: Duration) -> usize {
        let mut runs = self.runs.lock().await;

        let finished = tokio::time::timeout(grace, async {
            while let Some(result) = runs.join_next().await {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "Workflow run ended abnormally");
                }
            }
        })
        .await
        .is_ok();
        if finished {
            return 0;
        }

        let aborted = runs.len();
        runs.abort_all();
        while runs.join_next().await.is_some() {}
        aborted
    }
}

fn reap(runs: &mut JoinSet<()>) {
    while let Some(result) = runs.try_join_next() {
        if let Err(e) = result {
            tracing::warn!(error = %e, "Workflow run ended abnormally");
        }
    }
}
