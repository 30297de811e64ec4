use log::{debug, trace};

use crate::{schema::JobRun, status::status_code};

use super::{Collector, CollectorContext, CycleReport};

/// Publishes `github_job{repo, id, head_branch, run_number, event, status}`
/// for every run returned by the repository-wide runs endpoint.
///
/// The raw status string is part of the label set while the value
/// carries the mapped status code, so a run moving from queued to
/// completed leaves its queued series behind with the last value it had.
/// Every run id ever seen stays in the registry.
pub struct JobCollector {
    ctx: CollectorContext,
}

impl JobCollector {
    pub fn new(ctx: CollectorContext) -> Self {
        Self { ctx }
    }

    fn publish(&self, repo: &str, run: &JobRun) {
        let id = run.id.to_string();
        let run_number = run.run_number.to_string();

        trace!("[jobs] {} run {} updated_at={}", repo, id, run.updated_at);

        self.ctx
            .metrics
            .job_status
            .with_label_values(&[
                repo,
                id.as_str(),
                run.head_branch.as_str(),
                run_number.as_str(),
                run.event.as_str(),
                run.status.as_str(),
            ])
            .set(status_code(&run.status, &run.conclusion));
    }
}

#[async_trait::async_trait]
impl Collector for JobCollector {
    fn name(&self) -> &'static str {
        "jobs"
    }

    async fn collect(&self) -> anyhow::Result<CycleReport> {
        let mut report = CycleReport::default();

        for repo in self.ctx.repositories.iter() {
            let page = match self.ctx.api.workflow_runs(repo).await {
                Ok(page) => page,
                Err(e) => {
                    self.ctx.handle_failure(self.name(), repo, e, &mut report)?;
                    continue;
                }
            };

            debug!("[{}] {}: total_count={}", self.name(), repo, page.total_count);

            for run in &page.workflow_runs {
                self.publish(repo, run);
                report.samples += 1;
            }
            report.repositories += 1;
        }

        Ok(report)
    }
}
