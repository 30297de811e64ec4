use log::debug;

use crate::{
    schema::{Workflow, WorkflowRun},
    status::status_code,
};

use super::{Collector, CollectorContext, CycleReport};

/// Publishes per-workflow state for every repository:
///
/// - `github_workflow_latest_status{repo, workflow, head_branch, event}`
///   from the run at the head of the workflow's history
/// - `github_workflow_runs{repo, workflow, id, url, created_at, updated_at,
///   head_branch, event}` for every run in the history
///
/// COST:
/// - One request for the workflow list plus one per workflow, so N+1
///   requests per repository and cycle
///
/// NOTES:
/// - "Latest" is whatever GitHub returns first; the API lists runs newest
///   first and timestamps are not compared
/// - A workflow with an empty history leaves both families untouched
/// - A failed history fetch skips that workflow only (isolate policy)
pub struct WorkflowStatusCollector {
    ctx: CollectorContext,
}

impl WorkflowStatusCollector {
    pub fn new(ctx: CollectorContext) -> Self {
        Self { ctx }
    }

    fn publish_latest(&self, repo: &str, workflow: &Workflow, run: &WorkflowRun, value: f64) {
        self.ctx
            .metrics
            .workflow_latest_status
            .with_label_values(&[
                repo,
                workflow.name.as_str(),
                run.head_branch.as_str(),
                run.event.as_str(),
            ])
            .set(value);
    }

    fn publish_run(&self, repo: &str, workflow: &Workflow, run: &WorkflowRun, value: f64) {
        let id = run.id.to_string();

        self.ctx
            .metrics
            .workflow_runs
            .with_label_values(&[
                repo,
                workflow.name.as_str(),
                id.as_str(),
                run.url.as_str(),
                run.created_at.as_str(),
                run.updated_at.as_str(),
                run.head_branch.as_str(),
                run.event.as_str(),
            ])
            .set(value);
    }
}

#[async_trait::async_trait]
impl Collector for WorkflowStatusCollector {
    fn name(&self) -> &'static str {
        "workflows"
    }

    async fn collect(&self) -> anyhow::Result<CycleReport> {
        let mut report = CycleReport::default();

        for repo in self.ctx.repositories.iter() {
            let workflows = match self.ctx.api.workflows(repo).await {
                Ok(page) => {
                    debug!("[{}] {}: {} workflows", self.name(), repo, page.total_count);
                    page.workflows
                }
                Err(e) => {
                    self.ctx.handle_failure(self.name(), repo, e, &mut report)?;
                    continue;
                }
            };

            for workflow in &workflows {
                let history = match self.ctx.api.workflow_history(repo, workflow.id).await {
                    Ok(page) => page,
                    Err(e) => {
                        self.ctx.handle_failure(self.name(), repo, e, &mut report)?;
                        continue;
                    }
                };

                debug!(
                    "[{}] {} / {} ({}): total_count={}",
                    self.name(),
                    repo,
                    workflow.name,
                    workflow.state,
                    history.total_count
                );

                for (idx, run) in history.workflow_runs.iter().enumerate() {
                    let value = status_code(&run.status, &run.conclusion);
                    if idx == 0 {
                        self.publish_latest(repo, workflow, run, value);
                        report.samples += 1;
                    }
                    self.publish_run(repo, workflow, run, value);
                    report.samples += 1;
                }
            }
            report.repositories += 1;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::collector::testing::{FakeApi, context};
    use crate::config::FailurePolicy;
    use crate::metrics::ExporterMetrics;
    use crate::util::{workflow_runs_path, workflows_path};

    const TWO_WORKFLOWS: &str = r#"{
        "total_count": 2,
        "workflows": [
            {"id": 10, "name": "CI", "state": "active"},
            {"id": 20, "name": "Release", "state": "active"}
        ]
    }"#;

    const CI_HISTORY: &str = r#"{
        "total_count": 2,
        "workflow_runs": [
            {
                "id": 1002,
                "head_branch": "main",
                "event": "push",
                "status": "queued",
                "conclusion": "",
                "created_at": "2024-05-02T10:00:00Z",
                "updated_at": "2024-05-02T10:00:05Z",
                "html_url": "https://github.com/octo/app/actions/runs/1002"
            },
            {
                "id": 1001,
                "head_branch": "main",
                "event": "push",
                "status": "completed",
                "conclusion": "success",
                "created_at": "2024-05-01T10:00:00Z",
                "updated_at": "2024-05-01T10:04:00Z",
                "html_url": "https://github.com/octo/app/actions/runs/1001"
            }
        ]
    }"#;

    fn latest(metrics: &ExporterMetrics, workflow: &str, branch: &str, event: &str) -> f64 {
        metrics
            .workflow_latest_status
            .with_label_values(&["octo/app", workflow, branch, event])
            .get()
    }

    fn run_value(metrics: &ExporterMetrics, id: &str, created: &str, updated: &str) -> f64 {
        let url = format!("https://github.com/octo/app/actions/runs/{}", id);
        metrics
            .workflow_runs
            .with_label_values(&["octo/app", "CI", id, url.as_str(), created, updated, "main", "push"])
            .get()
    }

    fn api_with_ci_history() -> Arc<FakeApi> {
        let api = Arc::new(FakeApi::default());
        api.respond(workflows_path("octo/app"), TWO_WORKFLOWS)
            .respond(workflow_runs_path("octo/app", 10), CI_HISTORY)
            .respond(
                workflow_runs_path("octo/app", 20),
                r#"{"total_count":0,"workflow_runs":[]}"#,
            );
        api
    }

    #[tokio::test]
    async fn head_of_history_is_latest_and_every_run_is_published() {
        let api = api_with_ci_history();
        let (ctx, metrics) = context(api.clone(), &["octo/app"], FailurePolicy::Isolate);

        let report = WorkflowStatusCollector::new(ctx).collect().await.unwrap();

        // queued with empty conclusion -> 4
        assert_eq!(latest(&metrics, "CI", "main", "push"), 4.0);
        assert_eq!(
            run_value(&metrics, "1002", "2024-05-02T10:00:00Z", "2024-05-02T10:00:05Z"),
            4.0
        );
        assert_eq!(
            run_value(&metrics, "1001", "2024-05-01T10:00:00Z", "2024-05-01T10:04:00Z"),
            1.0
        );
        assert_eq!(report.samples, 3);
        assert_eq!(
            api.calls(),
            vec![
                workflows_path("octo/app"),
                workflow_runs_path("octo/app", 10),
                workflow_runs_path("octo/app", 20),
            ]
        );
    }

    #[tokio::test]
    async fn empty_history_leaves_gauges_untouched() {
        let api = api_with_ci_history();
        let (ctx, metrics) = context(api, &["octo/app"], FailurePolicy::Isolate);

        WorkflowStatusCollector::new(ctx).collect().await.unwrap();

        let text = metrics.encode().unwrap();
        assert!(!text.contains("workflow=\"Release\""));
        assert_eq!(metrics.sample_count("github_workflow_latest_status"), 1);
        assert_eq!(metrics.sample_count("github_workflow_runs"), 2);
    }

    #[tokio::test]
    async fn runs_differing_only_by_id_do_not_collide() {
        let api = Arc::new(FakeApi::default());
        api.respond(
            workflows_path("octo/app"),
            r#"{"workflows":[{"id":10,"name":"CI","state":"active"}]}"#,
        )
        .respond(
            workflow_runs_path("octo/app", 10),
            r#"{"workflow_runs":[
                {"id":1,"head_branch":"main","event":"push","status":"completed","conclusion":"success",
                 "created_at":"t","updated_at":"t","html_url":"u"},
                {"id":2,"head_branch":"main","event":"push","status":"completed","conclusion":"failure",
                 "created_at":"t","updated_at":"t","html_url":"u"}
            ]}"#,
        );
        let (ctx, metrics) = context(api, &["octo/app"], FailurePolicy::Isolate);

        WorkflowStatusCollector::new(ctx).collect().await.unwrap();

        assert_eq!(metrics.sample_count("github_workflow_runs"), 2);
        let one = metrics
            .workflow_runs
            .with_label_values(&["octo/app", "CI", "1", "u", "t", "t", "main", "push"])
            .get();
        let two = metrics
            .workflow_runs
            .with_label_values(&["octo/app", "CI", "2", "u", "t", "t", "main", "push"])
            .get();
        assert_eq!((one, two), (1.0, 0.0));
    }

    #[tokio::test]
    async fn failed_history_skips_only_that_workflow() {
        let api = Arc::new(FakeApi::default());
        api.respond(workflows_path("octo/app"), TWO_WORKFLOWS)
            .fail(workflow_runs_path("octo/app", 10))
            .respond(
                workflow_runs_path("octo/app", 20),
                r#"{"workflow_runs":[{"id":5,"head_branch":"v1","event":"release",
                    "status":"in_progress","conclusion":null,"created_at":"c","updated_at":"u",
                    "html_url":"h"}]}"#,
            );
        let (ctx, metrics) = context(api, &["octo/app"], FailurePolicy::Isolate);

        let report = WorkflowStatusCollector::new(ctx).collect().await.unwrap();

        assert_eq!(report.failures, 1);
        assert_eq!(latest(&metrics, "Release", "v1", "release"), 3.0);
        assert_eq!(
            metrics.fetch_errors.with_label_values(&["workflows", "octo/app"]).get(),
            1
        );
    }

    #[tokio::test]
    async fn failed_workflow_list_skips_repository() {
        let api = api_with_ci_history();
        api.fail(workflows_path("octo/other"));
        let (ctx, metrics) = context(api.clone(), &["octo/other", "octo/app"], FailurePolicy::Isolate);

        let report = WorkflowStatusCollector::new(ctx).collect().await.unwrap();

        assert_eq!(report.repositories, 1);
        assert_eq!(report.failures, 1);
        assert_eq!(latest(&metrics, "CI", "main", "push"), 4.0);
    }

    #[tokio::test]
    async fn fatal_policy_aborts_on_history_failure() {
        let api = Arc::new(FakeApi::default());
        api.respond(workflows_path("octo/app"), TWO_WORKFLOWS)
            .fail(workflow_runs_path("octo/app", 10));
        let (ctx, _metrics) = context(api.clone(), &["octo/app"], FailurePolicy::Fatal);

        assert!(WorkflowStatusCollector::new(ctx).collect().await.is_err());
        assert_eq!(
            api.calls(),
            vec![workflows_path("octo/app"), workflow_runs_path("octo/app", 10)]
        );
    }

    #[tokio::test]
    async fn latest_moves_with_the_head_of_history() {
        let api = api_with_ci_history();
        let (ctx, metrics) = context(api.clone(), &["octo/app"], FailurePolicy::Isolate);
        let collector = WorkflowStatusCollector::new(ctx);

        collector.collect().await.unwrap();
        let finished = CI_HISTORY
            .replacen("\"queued\"", "\"completed\"", 1)
            .replacen("\"conclusion\": \"\"", "\"conclusion\": \"success\"", 1);
        api.respond(workflow_runs_path("octo/app", 10), &finished);
        collector.collect().await.unwrap();

        assert_eq!(latest(&metrics, "CI", "main", "push"), 1.0);
    }
}
