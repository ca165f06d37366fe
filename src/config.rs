use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub github: GitHubConfig,
    pub notify: NotifyConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub release: ReleaseConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// How long shutdown waits for accepted runs before sweeping workspaces.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

impl ServerConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

#[derive(Deserialize, Clone)]
pub struct GitHubConfig {
    pub token: String,
    pub owner: String,
    pub repo: String,
    /// Base URL for GitHub Enterprise, e.g. `https://ghe.example.com/api/v3`.
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default = "default_ssh_host")]
    pub ssh_host: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

// Manual Debug impl to avoid leaking the API token
impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &"[REDACTED]")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_base_url", &self.api_base_url)
            .field("ssh_host", &self.ssh_host)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl GitHubConfig {
    /// SSH remote the workspaces clone from.
    pub fn ssh_remote_url(&self) -> String {
        format!("git@{}:{}/{}.git", self.ssh_host, self.owner, self.repo)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Deserialize, Clone)]
pub struct NotifyConfig {
    /// Chat channel that receives run results.
    pub channel: String,
    /// Incoming-webhook URL of the chat service. Results are only logged when unset.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Shared secret for `X-Signature-256` on `/commands`. Unsigned requests are
    /// accepted when unset.
    #[serde(default)]
    pub command_secret: Option<String>,
    /// Upper bound for one webhook delivery.
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u64,
}

impl NotifyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// Manual Debug impl to avoid leaking the webhook URL and command secret
impl std::fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("channel", &self.channel)
            .field("webhook_url", &self.webhook_url.as_ref().map(|_| "[REDACTED]"))
            .field(
                "command_secret",
                &self.command_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkspaceConfig {
    #[serde(default = "default_workspace_dir")]
    pub base_dir: PathBuf,
    /// Leave the clone on disk when a run fails, for inspection.
    #[serde(default)]
    pub keep_on_failure: bool,
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            base_dir: default_workspace_dir(),
            keep_on_failure: false,
            command_timeout_secs: default_command_timeout(),
        }
    }
}

impl WorkspaceConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReleaseConfig {
    #[serde(default = "default_next_branch")]
    pub next_branch: String,
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
    /// Changelog generator command line. `{owner}` and `{repo}` are substituted.
    #[serde(default = "default_changelog_command")]
    pub changelog_command: String,
    #[serde(default = "default_changelog_file")]
    pub changelog_file: String,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            next_branch: default_next_branch(),
            base_branch: default_base_branch(),
            changelog_command: default_changelog_command(),
            changelog_file: default_changelog_file(),
        }
    }
}

impl ReleaseConfig {
    /// Split the changelog command into program and arguments, filling in
    /// the repository coordinates.
    pub fn changelog_argv(&self, owner: &str, repo: &str) -> Result<Vec<String>> {
        let argv: Vec<String> = self
            .changelog_command
            .split_whitespace()
            .map(|part| part.replace("{owner}", owner).replace("{repo}", repo))
            .collect();
        if argv.is_empty() {
            return Err(AppError::Config(
                "release.changelog_command is empty".to_string(),
            ));
        }
        Ok(argv)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_ssh_host() -> String {
    "github.com".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_notify_timeout() -> u64 {
    10
}

fn default_shutdown_grace() -> u64 {
    300
}

fn default_workspace_dir() -> PathBuf {
    PathBuf::from("/tmp/release-bot-workspaces")
}

fn default_command_timeout() -> u64 {
    600
}

fn default_next_branch() -> String {
    "next".to_string()
}

fn default_base_branch() -> String {
    "master".to_string()
}

fn default_changelog_command() -> String {
    "github_changelog_generator --user {owner} --project {repo}".to_string()
}

fn default_changelog_file() -> String {
    "CHANGELOG.md".to_string()
}

impl AppConfig {
    /// Load configuration from `RELEASE_BOT__*` environment variables,
    /// e.g. `RELEASE_BOT__GITHUB__TOKEN`.
    pub fn load() -> Result<Self> {
        Self::from_environment(Self::environment())
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix("RELEASE_BOT")
            .separator("__")
            .try_parsing(true)
    }

    fn from_environment(env: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(env)
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))
    }

    pub fn github_token(&self) -> &str {
        &self.github.token
    }

    pub fn command_secret(&self) -> Option<&str> {
        self.notify.command_secret.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let source = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<config::Map<String, String>>();
        AppConfig::environment().source(Some(source))
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("RELEASE_BOT__GITHUB__TOKEN", "ghp_secret"),
            ("RELEASE_BOT__GITHUB__OWNER", "acme"),
            ("RELEASE_BOT__GITHUB__REPO", "widgets"),
            ("RELEASE_BOT__NOTIFY__CHANNEL", "releases"),
        ]
    }

    #[test]
    fn test_defaults_fill_optional_sections() {
        let config = AppConfig::from_environment(env(&required())).unwrap();

        assert_eq!(config.github.owner, "acme");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.release.next_branch, "next");
        assert_eq!(config.release.base_branch, "master");
        assert_eq!(config.workspace.command_timeout_secs, 600);
        assert!(!config.workspace.keep_on_failure);
        assert!(config.notify.webhook_url.is_none());
        assert_eq!(config.notify.timeout(), Duration::from_secs(10));
        assert_eq!(config.server.shutdown_grace(), Duration::from_secs(300));
    }

    #[test]
    fn test_overrides_are_parsed() {
        let mut vars = required();
        vars.push(("RELEASE_BOT__WORKSPACE__KEEP_ON_FAILURE", "true"));
        vars.push(("RELEASE_BOT__SERVER__PORT", "8080"));
        let config = AppConfig::from_environment(env(&vars)).unwrap();

        assert!(config.workspace.keep_on_failure);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_missing_token_is_config_error() {
        let vars: Vec<_> = required()
            .into_iter()
            .filter(|(k, _)| !k.ends_with("TOKEN"))
            .collect();
        let err = AppConfig::from_environment(env(&vars)).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = AppConfig::from_environment(env(&required())).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("ghp_secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_ssh_remote_url() {
        let config = AppConfig::from_environment(env(&required())).unwrap();
        assert_eq!(
            config.github.ssh_remote_url(),
            "git@github.com:acme/widgets.git"
        );
    }

    #[test]
    fn test_changelog_argv_substitutes_coordinates() {
        let release = ReleaseConfig::default();
        let argv = release.changelog_argv("acme", "widgets").unwrap();
        assert_eq!(
            argv,
            vec![
                "github_changelog_generator",
                "--user",
                "acme",
                "--project",
                "widgets"
            ]
        );
    }

    #[test]
    fn test_empty_changelog_command_rejected() {
        let release = ReleaseConfig {
            changelog_command: "   ".to_string(),
            ..ReleaseConfig::default()
        };
        assert!(release.changelog_argv("acme", "widgets").is_err());
    }
}
