use std::sync::Arc;

use prometheus::{Encoder, GaugeVec, IntCounterVec, Opts, Registry, TextEncoder};

/// Gauge families published by the collectors plus the exporter's own
/// runtime counters.
///
/// Purpose:
/// - Hold every metric family the exporter exposes
/// - Keep the registry injectable so each test owns a private one
///
/// Semantics:
/// - Every publish is a `set`: last write wins, nothing accumulates
/// - Samples are never removed; a runner or run that disappears from
///   the API keeps its last value until the process restarts
/// - `github_job` and `github_workflow_runs` grow by one series per
///   run id ever seen
///
/// Concurrency:
/// - prometheus vectors are internally synchronized, the three
///   collectors write through a shared `Arc<ExporterMetrics>`
pub struct ExporterMetrics {
    registry: Registry,

    // Runners
    pub runner_status: GaugeVec,

    // Repository-wide runs
    pub job_status: GaugeVec,

    // Per-workflow runs
    pub workflow_latest_status: GaugeVec,
    pub workflow_runs: GaugeVec,

    // Exporter health
    pub cycles: IntCounterVec,
    pub fetch_errors: IntCounterVec,
    pub cycle_duration: GaugeVec,
}

impl ExporterMetrics {
    /// Creates all families and registers them with `registry`.
    pub fn new(registry: Registry) -> anyhow::Result<Arc<Self>> {
        let runner_status = GaugeVec::new(
            Opts::new("github_runner_status", "runner status"),
            &["repo", "os", "name"],
        )?;

        let job_status = GaugeVec::new(
            Opts::new("github_job", "job status"),
            &["repo", "id", "head_branch", "run_number", "event", "status"],
        )?;

        let workflow_latest_status = GaugeVec::new(
            Opts::new("github_workflow_latest_status", "workflow latest status"),
            &["repo", "workflow", "head_branch", "event"],
        )?;

        let workflow_runs = GaugeVec::new(
            Opts::new("github_workflow_runs", "Workflow runs"),
            &[
                "repo",
                "workflow",
                "id",
                "url",
                "created_at",
                "updated_at",
                "head_branch",
                "event",
            ],
        )?;

        let cycles = IntCounterVec::new(
            Opts::new("github_exporter_cycles_total", "Completed collection cycles"),
            &["collector"],
        )?;

        let fetch_errors = IntCounterVec::new(
            Opts::new(
                "github_exporter_fetch_errors_total",
                "Failed GitHub API requests",
            ),
            &["collector", "repo"],
        )?;

        let cycle_duration = GaugeVec::new(
            Opts::new(
                "github_exporter_last_cycle_duration_seconds",
                "Wall time of the last completed cycle",
            ),
            &["collector"],
        )?;

        registry.register(Box::new(runner_status.clone()))?;
        registry.register(Box::new(job_status.clone()))?;
        registry.register(Box::new(workflow_latest_status.clone()))?;
        registry.register(Box::new(workflow_runs.clone()))?;
        registry.register(Box::new(cycles.clone()))?;
        registry.register(Box::new(fetch_errors.clone()))?;
        registry.register(Box::new(cycle_duration.clone()))?;

        Ok(Arc::new(Self {
            registry,
            runner_status,
            job_status,
            workflow_latest_status,
            workflow_runs,
            cycles,
            fetch_errors,
            cycle_duration,
        }))
    }

    /// Renders the registry in the Prometheus text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Number of samples currently held by the family called `name`.
    #[cfg(test)]
    pub fn sample_count(&self, name: &str) -> usize {
        self.registry
            .gather()
            .iter()
            .filter(|family| family.name() == name)
            .map(|family| family.get_metric().len())
            .sum()
    }
}
