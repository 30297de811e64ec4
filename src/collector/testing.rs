//! In-memory `ActionsApi` for collector tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use prometheus::Registry;
use serde::de::DeserializeOwned;

use crate::{
    config::FailurePolicy,
    github::{ActionsApi, FetchError},
    metrics::ExporterMetrics,
    schema::{JobRunsPage, RunnersPage, WorkflowRunsPage, WorkflowsPage},
    util,
};

use super::CollectorContext;

/// Serves canned JSON bodies keyed by request path.
///
/// Paths without a body answer 404, paths marked failing answer 500.
#[derive(Default)]
pub struct FakeApi {
    bodies: Mutex<HashMap<String, String>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn respond(&self, path: String, body: &str) -> &Self {
        self.bodies.lock().unwrap().insert(path, body.to_string());
        self
    }

    pub fn fail(&self, path: String) -> &Self {
        self.failing.lock().unwrap().insert(path);
        self
    }

    /// Paths requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn fetch<T: DeserializeOwned>(&self, path: String) -> Result<T, FetchError> {
        self.calls.lock().unwrap().push(path.clone());

        if self.failing.lock().unwrap().contains(&path) {
            return Err(FetchError::Status { path, status: 500 });
        }

        let body = self.bodies.lock().unwrap().get(&path).cloned();
        match body {
            Some(body) => {
                serde_json::from_str(&body).map_err(|source| FetchError::Decode { path, source })
            }
            None => Err(FetchError::Status { path, status: 404 }),
        }
    }
}

#[async_trait::async_trait]
impl ActionsApi for FakeApi {
    async fn runners(&self, repo: &str) -> Result<RunnersPage, FetchError> {
        self.fetch(util::runners_path(repo))
    }

    async fn workflow_runs(&self, repo: &str) -> Result<JobRunsPage, FetchError> {
        self.fetch(util::runs_path(repo))
    }

    async fn workflows(&self, repo: &str) -> Result<WorkflowsPage, FetchError> {
        self.fetch(util::workflows_path(repo))
    }

    async fn workflow_history(
        &self,
        repo: &str,
        workflow_id: u64,
    ) -> Result<WorkflowRunsPage, FetchError> {
        self.fetch(util::workflow_runs_path(repo, workflow_id))
    }
}

/// Builds a context over `api` with a private registry.
pub fn context(
    api: Arc<FakeApi>,
    repositories: &[&str],
    policy: FailurePolicy,
) -> (CollectorContext, Arc<ExporterMetrics>) {
    let metrics = ExporterMetrics::new(Registry::new()).unwrap();
    let ctx = CollectorContext {
        api,
        metrics: metrics.clone(),
        repositories: repositories.iter().map(|r| r.to_string()).collect(),
        policy,
    };
    (ctx, metrics)
}
