//! HTTP surface of the exporter.
//!
//! - `GET /`        -> hint pointing at the metrics path
//! - `GET /metrics` -> Prometheus text exposition of the registry

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
};
use log::{error, info};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::metrics::ExporterMetrics;

pub fn router(metrics: Arc<ExporterMetrics>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
}

async fn index() -> &'static str {
    "/metrics"
}

async fn metrics_handler(State(metrics): State<Arc<ExporterMetrics>>) -> Response {
    match metrics.encode() {
        Ok(body) => ([(CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            error!("failed to encode metrics: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics").into_response()
        }
    }
}

/// Serves until `cancel` fires, then stops accepting and drains open
/// connections.
pub async fn serve(
    listener: TcpListener,
    metrics: Arc<ExporterMetrics>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    info!("serving metrics on http://{}/metrics", listener.local_addr()?);

    axum::serve(listener, router(metrics))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    Ok(())
}
