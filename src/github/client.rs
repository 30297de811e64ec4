use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;

use crate::{
    config::GithubConfig,
    schema::{JobRunsPage, RunnersPage, WorkflowRunsPage, WorkflowsPage},
    util,
};

use super::api::{ActionsApi, FetchError};

const USER_AGENT: &str = concat!("github-actions-exporter/", env!("CARGO_PKG_VERSION"));

/// Upper bound for a single request, connect + body.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest implementation of `ActionsApi`.
///
/// Holds one connection pool shared by all collectors. Every request
/// carries `Authorization: token <secret>`.
///
/// Only the first page of each endpoint is read and nothing is done
/// about rate limits: a short refresh over many repositories can hit
/// GitHub's hourly quota, which then surfaces as `FetchError::Status`.
#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl GithubClient {
    pub fn new(cfg: &GithubConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: cfg.api_url.trim_end_matches('/').to_string(),
            token: cfg.token.clone(),
        })
    }

    /// Performs one GET and decodes the body as `T`.
    async fn get<T: DeserializeOwned>(&self, path: String) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);

        let resp = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await;

        let resp = match resp {
            Ok(resp) => resp,
            Err(source) => return Err(FetchError::Transport { path, source }),
        };

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                path,
                status: status.as_u16(),
            });
        }

        let body = match resp.bytes().await {
            Ok(body) => body,
            Err(source) => return Err(FetchError::Transport { path, source }),
        };

        serde_json::from_slice(&body).map_err(|source| FetchError::Decode { path, source })
    }
}

#[async_trait::async_trait]
impl ActionsApi for GithubClient {
    async fn runners(&self, repo: &str) -> Result<RunnersPage, FetchError> {
        self.get(util::runners_path(repo)).await
    }

    async fn workflow_runs(&self, repo: &str) -> Result<JobRunsPage, FetchError> {
        self.get(util::runs_path(repo)).await
    }

    async fn workflows(&self, repo: &str) -> Result<WorkflowsPage, FetchError> {
        self.get(util::workflows_path(repo)).await
    }

    async fn workflow_history(
        &self,
        repo: &str,
        workflow_id: u64,
    ) -> Result<WorkflowRunsPage, FetchError> {
        self.get(util::workflow_runs_path(repo, workflow_id)).await
    }
}
