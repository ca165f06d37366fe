use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::config::NotifyConfig;
use crate::error::{AppError, Result};

/// Destination for human-readable run results.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Posts messages to a chat service's incoming webhook.
pub struct ChatWebhookSink {
    client: Client,
    url: String,
    channel: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

impl ChatWebhookSink {
    /// `timeout` bounds each delivery, from connect to the end of the response.
    pub fn new(url: &str, channel: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            channel: channel.to_string(),
            timeout,
        })
    }

    fn classify(&self, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::Timeout {
                operation: "post chat message".to_string(),
                after: self.timeout,
            }
        } else {
            AppError::Http(err)
        }
    }
}

#[async_trait]
impl NotificationSink for ChatWebhookSink {
    async fn notify(&self, message: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&ChatMessage {
                channel: &self.channel,
                text: message,
            })
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Transport(format!(
                "Chat webhook returned {status}: {body}"
            )));
        }
        Ok(())
    }
}

/// Writes messages to the log only. Used when no chat webhook is configured.
pub struct LogSink {
    channel: String,
}

impl LogSink {
    pub fn new(channel: &str) -> Self {
        Self {
            channel: channel.to_string(),
        }
    }
}

#[async_trait]
impl NotificationSink for LogSink {
    async fn notify(&self, message: &str) -> Result<()> {
        tracing::info!(channel = %self.channel, text = message, "Notification");
        Ok(())
    }
}

/// Pick the sink for the configured notification settings.
pub fn from_config(config: &NotifyConfig) -> Result<Arc<dyn NotificationSink>> {
    let sink: Arc<dyn NotificationSink> = match config.webhook_url {
        Some(ref url) => Arc::new(ChatWebhookSink::new(url, &config.channel, config.timeout())?),
        None => Arc::new(LogSink::new(&config.channel)),
    };
    Ok(sink)
}
