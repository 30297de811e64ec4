// ------------------------------------------------------------
// Module declarations
// ------------------------------------------------------------
//
// - config:    CLI / environment / JSON configuration
// - schema:    GitHub Actions response types
// - status:    (status, conclusion) -> gauge value
// - util:      Repository parsing and API paths
// - github:    ActionsApi trait and its reqwest client
// - metrics:   Gauge families on an injected registry
// - collector: The three collectors and their refresh loop
// - server:    `/` and `/metrics` endpoints
//
mod collector;
mod config;
mod github;
mod metrics;
mod schema;
mod server;
mod status;
mod util;

use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use futures_util::future::select_all;
use log::{error, info};
use prometheus::Registry;
use rustls::crypto::{CryptoProvider, ring};
use tokio::{net::TcpListener, task::JoinError};
use tokio_util::sync::CancellationToken;

use collector::{
    Collector, CollectorContext, JobCollector, RunnerCollector, WorkflowStatusCollector,
    run_collector,
};
use config::{Cli, Config};
use github::{ActionsApi, GithubClient};
use metrics::ExporterMetrics;

// ------------------------------------------------------------
// Application entry point
// ------------------------------------------------------------
//
// Responsibilities:
// - Initialize cryptography backend (rustls) and logging
// - Load and validate configuration (the only fatal path by default)
// - Start one task per collector plus the metrics server
// - Stop everything on Ctrl-C, or when a collector escalates
//
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    install_crypto_provider();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load(Cli::parse())?;

    info!(
        "starting github-actions-exporter {} ({} repositories, {:?} policy)",
        env!("CARGO_PKG_VERSION"),
        config.github.repositories.len(),
        config.failure_policy
    );

    let metrics = ExporterMetrics::new(Registry::new())?;
    let api: Arc<dyn ActionsApi> = Arc::new(GithubClient::new(&config.github)?);

    let ctx = CollectorContext {
        api,
        metrics: metrics.clone(),
        repositories: config.github.repositories.clone().into(),
        policy: config.failure_policy,
    };

    let collectors: Vec<Arc<dyn Collector>> = vec![
        Arc::new(RunnerCollector::new(ctx.clone())),
        Arc::new(JobCollector::new(ctx.clone())),
        Arc::new(WorkflowStatusCollector::new(ctx)),
    ];

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("binding port {}", config.port))?;

    let cancel = CancellationToken::new();

    let loops: Vec<_> = collectors
        .into_iter()
        .map(|collector| {
            tokio::spawn(run_collector(
                collector,
                config.github.refresh,
                cancel.child_token(),
                metrics.clone(),
            ))
        })
        .collect();

    let mut http = tokio::spawn(server::serve(listener, metrics.clone(), cancel.clone()));

    // --------------------------------------------------------
    // Wait for whichever ends first
    // --------------------------------------------------------
    let result = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for ctrl-c")?;
            info!("shutdown requested");
            Ok(())
        }

        (joined, _, _) = select_all(loops) => flatten(joined),

        joined = &mut http => {
            flatten(joined)?;
            bail!("metrics server stopped unexpectedly");
        }
    };

    if let Err(e) = &result {
        error!("exporter stopping: {:#}", e);
    }

    cancel.cancel();
    flatten(http.await)?;

    result
}

/// Installs the `ring` provider as the process-wide rustls default.
///
/// Calling it more than once is harmless.
fn install_crypto_provider() {
    let _ = CryptoProvider::install_default(ring::default_provider());
}

fn flatten(joined: Result<anyhow::Result<()>, JoinError>) -> anyhow::Result<()> {
    joined?
}
