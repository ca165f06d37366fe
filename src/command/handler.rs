use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use serde::Deserialize;

use crate::command::signature::verify_signature;
use crate::command::Command;
use crate::server::AppState;
use crate::workflow;

/// Body posted by the chat relay for every message addressed to the bot.
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub text: String,
    #[serde(default)]
    pub user: Option<String>,
}

pub async fn handle_command(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(secret) = state.config.command_secret() {
        let signature = match headers.get("x-signature-256").and_then(|v| v.to_str().ok()) {
            Some(sig) => sig,
            None => {
                tracing::warn!("Missing X-Signature-256 header");
                return StatusCode::UNAUTHORIZED;
            }
        };

        if let Err(e) = verify_signature(secret, &body, signature) {
            tracing::warn!(error = %e, "Command signature verification failed");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let request: CommandRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse command request");
            return StatusCode::BAD_REQUEST;
        }
    };

    let command = match Command::parse(&request.text) {
        Ok(command) => command,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unrecognized command");
            return StatusCode::UNPROCESSABLE_ENTITY;
        }
    };

    tracing::info!(
        command = %command,
        user = request.user.as_deref().unwrap_or("unknown"),
        "Received command, starting workflow"
    );

    // Each run owns its workspace; runs are not serialized against each other
    let ctx = Arc::clone(&state.release);
    state
        .runs
        .spawn(async move {
            workflow::execute(ctx, command).await;
        })
        .await;

    StatusCode::ACCEPTED
}
