use std::sync::Arc;

use axum::{routing::post, Router};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::host::github::GitHubHost;
use crate::notify;
use crate::process::SystemRunner;
use crate::workflow::{ReleaseContext, RunTracker};

pub struct AppState {
    pub config: AppConfig,
    pub release: Arc<ReleaseContext>,
    pub runs: RunTracker,
}

impl AppState {
    pub fn new(config: AppConfig) -> crate::error::Result<Self> {
        let host = Arc::new(GitHubHost::new(&config.github)?);
        // github_changelog_generator reads its token from this variable
        let runner = Arc::new(
            SystemRunner::new(config.workspace.command_timeout())
                .with_env("CHANGELOG_GITHUB_TOKEN", config.github_token()),
        );
        let sink = notify::from_config(&config.notify)?;

        let release = Arc::new(ReleaseContext::from_config(&config, host, runner, sink));

        Ok(Self {
            config,
            release,
            runs: RunTracker::default(),
        })
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/commands", post(crate::command::handler::handle_command))
        .route("/health", axum::routing::get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}
