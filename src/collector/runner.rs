use std::sync::Arc;

use log::{debug, error, info};
use tokio::time::{Duration, Instant, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use crate::metrics::ExporterMetrics;

use super::Collector;

/// Runs `collector` every `refresh` until `cancel` fires.
///
/// This loop:
/// - Runs the first cycle immediately
/// - Waits for the next tick between cycles; a cycle slower than
///   `refresh` pushes the schedule back instead of bursting
/// - Records cycle count and duration per collector
///
/// GUARANTEES:
/// - Returns `Ok(())` once cancelled, also in the middle of a cycle
///   (in-flight requests are dropped)
/// - Returns `Err` when a cycle escalates under the fatal policy
pub async fn run_collector(
    collector: Arc<dyn Collector>,
    refresh: Duration,
    cancel: CancellationToken,
    metrics: Arc<ExporterMetrics>,
) -> anyhow::Result<()> {
    let name = collector.name();
    let mut ticker = interval(refresh);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("[{}] collector started, refresh every {:?}", name, refresh);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let started = Instant::now();

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = collector.collect() => result,
        };

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                error!("[{}] collector stopped: {:#}", name, e);
                return Err(e);
            }
        };

        let elapsed = started.elapsed();
        metrics.cycles.with_label_values(&[name]).inc();
        metrics
            .cycle_duration
            .with_label_values(&[name])
            .set(elapsed.as_secs_f64());

        debug!(
            "[{}] cycle done in {:?}: repos={} samples={} failures={}",
            name, elapsed, report.repositories, report.samples, report.failures
        );
    }

    info!("[{}] collector cancelled", name);
    Ok(())
}
