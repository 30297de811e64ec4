use log::debug;

use crate::schema::Runner;

use super::{Collector, CollectorContext, CycleReport};

/// Publishes `github_runner_status{repo, os, name}`: 1 online, 0 otherwise.
///
/// Runners removed from a repository keep their last sample.
pub struct RunnerCollector {
    ctx: CollectorContext,
}

impl RunnerCollector {
    pub fn new(ctx: CollectorContext) -> Self {
        Self { ctx }
    }

    fn publish(&self, repo: &str, runner: &Runner) {
        let value = if runner.is_online() { 1.0 } else { 0.0 };
        self.ctx
            .metrics
            .runner_status
            .with_label_values(&[repo, runner.os.as_str(), runner.name.as_str()])
            .set(value);
    }
}

#[async_trait::async_trait]
impl Collector for RunnerCollector {
    fn name(&self) -> &'static str {
        "runners"
    }

    async fn collect(&self) -> anyhow::Result<CycleReport> {
        let mut report = CycleReport::default();

        for repo in self.ctx.repositories.iter() {
            let page = match self.ctx.api.runners(repo).await {
                Ok(page) => page,
                Err(e) => {
                    self.ctx.handle_failure(self.name(), repo, e, &mut report)?;
                    continue;
                }
            };

            debug!("[{}] {}: total_count={}", self.name(), repo, page.total_count);

            for runner in &page.runners {
                self.publish(repo, runner);
                report.samples += 1;
            }
            report.repositories += 1;
        }

        Ok(report)
    }
}
