/// Collector module
///
/// This module groups all logic responsible for:
/// - Fetching one data family per collector from GitHub
/// - Mapping responses onto gauge samples
/// - Driving each collector on its own refresh loop
///
/// The collector layer sits between:
/// - The `ActionsApi` (input)
/// - `ExporterMetrics` (output sink)
///
/// Design notes:
/// - HTTP and URL details MUST NOT live here
/// - Repositories, and workflows inside a repository, are processed
///   sequentially in configured order
/// - Collectors share nothing mutable besides the metric sink
pub mod jobs;
pub mod runner;
pub mod self_hosted;
pub mod workflows;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use log::warn;

use crate::{
    config::FailurePolicy,
    github::{ActionsApi, FetchError},
    metrics::ExporterMetrics,
};

pub use jobs::JobCollector;
pub use runner::run_collector;
pub use self_hosted::RunnerCollector;
pub use workflows::WorkflowStatusCollector;

/// Outcome of one cycle, used for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Repositories whose data was published
    pub repositories: usize,

    /// Gauge samples written
    pub samples: usize,

    /// Fetches that failed and were skipped
    pub failures: usize,
}

/// A unit that fetches one data family and publishes gauge samples.
///
/// CONTRACT:
/// - `collect` performs exactly one cycle over all repositories
/// - An `Err` means the failure policy escalated; the loop stops
#[async_trait::async_trait]
pub trait Collector: Send + Sync {
    /// Stable identifier, used in logs and as the `collector` label.
    fn name(&self) -> &'static str;

    async fn collect(&self) -> anyhow::Result<CycleReport>;
}

/// Everything a collector needs, injected at construction.
#[derive(Clone)]
pub struct CollectorContext {
    pub api: Arc<dyn ActionsApi>,
    pub metrics: Arc<ExporterMetrics>,
    pub repositories: Arc<[String]>,
    pub policy: FailurePolicy,
}

impl CollectorContext {
    /// Records a failed fetch and applies the failure policy.
    ///
    /// - Isolate: logs, counts and returns `Ok(())` so the caller skips
    ///   the failed repository or workflow
    /// - Fatal: returns the error for the caller to propagate
    pub fn handle_failure(
        &self,
        collector: &str,
        repo: &str,
        err: FetchError,
        report: &mut CycleReport,
    ) -> anyhow::Result<()> {
        self.metrics
            .fetch_errors
            .with_label_values(&[collector, repo])
            .inc();
        report.failures += 1;

        match self.policy {
            FailurePolicy::Isolate => {
                warn!("[{}] skipping GET {}: {}", collector, err.path(), err);
                Ok(())
            }
            FailurePolicy::Fatal => {
                let path = err.path().to_string();
                Err(anyhow::Error::new(err)
                    .context(format!("{} collector failed on GET {}", collector, path)))
            }
        }
    }
}
