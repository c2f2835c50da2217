//! HTTP exposition of the Prometheus registry.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn render(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

/// Builds the `/metrics` and `/health` routes.
pub fn router(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(render)).route("/health", get(health)).with_state(handle)
}

/// Serves the exposition routes on `listener` until `token` is cancelled.
pub async fn serve(
    listener: TcpListener,
    handle: PrometheusHandle,
    token: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(address = %addr, "Metrics server listening.");
    }
    axum::serve(listener, router(handle))
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await
}
