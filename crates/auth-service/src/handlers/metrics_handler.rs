//! Prometheus metrics endpoint.
//!
//! Unauthenticated so Prometheus can scrape it. Labels carry no usernames,
//! client ids or tokens.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// Returns 200 OK with Prometheus text format:
/// ```text
/// # TYPE auth_token_validations_total counter
/// auth_token_validations_total{status="success",error_category="none"} 42
/// ```
#[tracing::instrument(skip_all, name = "auth.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
