use crate::schema::{JobRunsPage, RunnersPage, WorkflowRunsPage, WorkflowsPage};

/// Failure of a single API request.
///
/// Every variant carries the request path so that logs can name the
/// repository / workflow that failed. `Display` leaves it out; callers
/// prefix it.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, TLS, timeout, reset).
    #[error("request failed: {source}")]
    Transport {
        path: String,
        source: reqwest::Error,
    },

    /// GitHub answered with a non-2xx status (bad token, rate limit, 404).
    #[error("unexpected status {status}")]
    Status { path: String, status: u16 },

    /// The body was not the JSON document we expected.
    #[error("malformed response: {source}")]
    Decode {
        path: String,
        source: serde_json::Error,
    },
}

impl FetchError {
    pub fn path(&self) -> &str {
        match self {
            FetchError::Transport { path, .. }
            | FetchError::Status { path, .. }
            | FetchError::Decode { path, .. } => path,
        }
    }
}

/// ActionsApi is the seam between the collectors and GitHub.
///
/// One method per endpoint, each returning the first response page
/// fully decoded.
///
/// CONTRACT:
/// - `repo` is an already validated `owner/name`
/// - Implementations must not retry; the caller's failure policy
///   decides what a failed fetch means
///
/// THREAD SAFETY:
/// - Must be Send + Sync
/// - One instance is shared by all three collectors
#[async_trait::async_trait]
pub trait ActionsApi: Send + Sync {
    /// `GET /repos/{repo}/actions/runners`
    async fn runners(&self, repo: &str) -> Result<RunnersPage, FetchError>;

    /// `GET /repos/{repo}/actions/runs`
    async fn workflow_runs(&self, repo: &str) -> Result<JobRunsPage, FetchError>;

    /// `GET /repos/{repo}/actions/workflows`
    async fn workflows(&self, repo: &str) -> Result<WorkflowsPage, FetchError>;

    /// `GET /repos/{repo}/actions/workflows/{workflow_id}/runs`
    async fn workflow_history(
        &self,
        repo: &str,
        workflow_id: u64,
    ) -> Result<WorkflowRunsPage, FetchError>;
}
