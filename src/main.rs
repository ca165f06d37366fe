use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use release_bot::command::Command;
use release_bot::config::AppConfig;
use release_bot::server::{create_router, AppState};
use release_bot::shutdown::{graceful_shutdown, wait_for_shutdown};
use release_bot::workflow::{self, types::WorkflowOutcome};

#[derive(Parser)]
#[command(
    name = "release-bot",
    about = "Merge pull requests into next and prepare the next release branch"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Action>,
}

#[derive(Subcommand)]
enum Action {
    /// Accept chat commands over HTTP (default)
    Serve,
    /// Squash-merge a pull request into the release branch
    Merge {
        /// Pull request number
        number: u64,
    },
    /// Rebase next onto master, regenerate the changelog and freeze the release PR
    PrepareNext,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load()?;
    let state = Arc::new(AppState::new(config.clone())?);

    let command = match cli.command.unwrap_or(Action::Serve) {
        Action::Serve => return serve(config, state).await,
        Action::Merge { number } => Command::Merge { number },
        Action::PrepareNext => Command::PrepareNext,
    };

    match workflow::execute(Arc::clone(&state.release), command).await {
        WorkflowOutcome::Failed { step, error } => {
            anyhow::bail!("{command} failed at {step}: {error}")
        }
        outcome => {
            tracing::info!(outcome = ?outcome, "Done");
            Ok(())
        }
    }
}

async fn serve(config: AppConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        owner = %config.github.owner,
        repo = %config.github.repo,
        "Starting release-bot server"
    );

    let app = create_router(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        config.server.host, config.server.port
    ))
    .await?;

    tracing::info!("Listening on {}", listener.local_addr()?);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    // Perform graceful shutdown cleanup
    graceful_shutdown(&state).await;

    Ok(())
}
