use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use octocrab::Octocrab;

use crate::config::GitHubConfig;
use crate::error::{AppError, Result};
use crate::host::types::*;
use crate::host::RemoteHost;

use super::mapper;

/// Page size for list requests; GitHub's maximum.
const PAGE_SIZE: u8 = 100;

pub struct GitHubHost {
    client: Octocrab,
    timeout: Duration,
}

impl GitHubHost {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(config.token.clone());

        if let Some(ref base) = config.api_base_url {
            builder = builder
                .base_uri(base.as_str())
                .map_err(|e| AppError::Config(format!("Invalid GitHub API base URL: {e}")))?;
        }

        let client = builder
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build octocrab client: {e}")))?;

        Ok(Self {
            client,
            timeout: config.request_timeout(),
        })
    }

    /// Run one API call under the configured request timeout.
    async fn bounded<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| AppError::Timeout {
                operation: operation.to_string(),
                after: self.timeout,
            })?
    }
}

#[async_trait]
impl RemoteHost for GitHubHost {
    async fn list_open_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        head_branch: &str,
    ) -> Result<Vec<PullRequestRef>> {
        tracing::debug!(owner, repo, head_branch, "Listing open pull requests");

        self.bounded("list pull requests", async {
            let first = self
                .client
                .pulls(owner, repo)
                .list()
                .state(octocrab::params::State::Open)
                .head(format!("{owner}:{head_branch}"))
                .per_page(PAGE_SIZE)
                .send()
                .await?;

            let all = self.client.all_pages(first).await?;
            Ok(all.iter().map(mapper::map_pull_request).collect())
        })
        .await
    }

    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pr: &CreatePullRequest,
    ) -> Result<PullRequestRef> {
        tracing::debug!(
            owner,
            repo,
            head = %pr.head_branch,
            base = %pr.base_branch,
            "Creating pull request"
        );

        self.bounded("create pull request", async {
            let created = self
                .client
                .pulls(owner, repo)
                .create(&pr.title, &pr.head_branch, &pr.base_branch)
                .maintainer_can_modify(pr.maintainer_can_modify)
                .send()
                .await?;

            Ok(mapper::map_pull_request(&created))
        })
        .await
    }

    async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequestRef> {
        self.bounded("get pull request", async {
            let pr = self.client.pulls(owner, repo).get(number).await?;
            Ok(mapper::map_pull_request(&pr))
        })
        .await
    }

    async fn merge_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        method: MergeMethod,
    ) -> Result<()> {
        tracing::debug!(owner, repo, number, %method, "Merging pull request");

        let octocrab_method = match method {
            MergeMethod::Squash => octocrab::params::pulls::MergeMethod::Squash,
            MergeMethod::Merge => octocrab::params::pulls::MergeMethod::Merge,
            MergeMethod::Rebase => octocrab::params::pulls::MergeMethod::Rebase,
        };

        self.bounded("merge pull request", async {
            let result = self
                .client
                .pulls(owner, repo)
                .merge(number)
                .method(octocrab_method)
                .send()
                .await
                .map_err(|e| mapper::classify_error(e, mapper::Call::Merge))?;

            if !result.merged {
                return Err(AppError::MergeConflict(
                    result
                        .message
                        .unwrap_or_else(|| format!("#{number} was not merged")),
                ));
            }
            Ok(())
        })
        .await
    }

    async fn add_labels(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        labels: &[String],
    ) -> Result<()> {
        self.bounded("add labels", async {
            self.client
                .issues(owner, repo)
                .add_labels(number, labels)
                .await?;
            Ok(())
        })
        .await
    }

    async fn add_comment(&self, owner: &str, repo: &str, number: u64, body: &str) -> Result<()> {
        self.bounded("add comment", async {
            self.client
                .issues(owner, repo)
                .create_comment(number, body)
                .await?;
            Ok(())
        })
        .await
    }
}
