//! Metrics definitions for the auth service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `auth_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `kind`: 2 values (access, refresh)
//! - `status`: 2 values (success, error)
//! - `error_category`: bounded by `TokenError::category` plus `none`
//! - `outcome`: 4 values (unchanged, renewed, user_missing, rejected)

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the global Prometheus recorder and return the handle used by
/// `GET /metrics`.
///
/// Must run before any metric is recorded. Fails if a recorder is already
/// installed in this process.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    builder()?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

/// A handle to a recorder that is NOT installed globally. Renders whatever
/// has been recorded into it, which is nothing unless installed elsewhere.
pub fn detached_handle() -> Result<PrometheusHandle, String> {
    Ok(builder()?.build_recorder().handle())
}

fn builder() -> Result<PrometheusBuilder, String> {
    PrometheusBuilder::new()
        // bcrypt dominates login latency; buckets span cost 10 through 14
        .set_buckets_for_metric(
            Matcher::Prefix("auth_token_issuance".to_string()),
            &[
                0.001, 0.005, 0.010, 0.050, 0.100, 0.250, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set token issuance buckets: {e}"))
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Record one signed token.
///
/// Metric: `auth_token_issuance_total`, `auth_token_issuance_duration_seconds`
/// Labels: `kind`, `status`
pub fn record_token_issuance(kind: &'static str, status: &'static str, duration: Duration) {
    histogram!("auth_token_issuance_duration_seconds", "kind" => kind, "status" => status)
        .record(duration.as_secs_f64());

    counter!("auth_token_issuance_total", "kind" => kind, "status" => status).increment(1);
}

/// Record a token validation result
///
/// Metric: `auth_token_validations_total`
/// Labels: `status`, `error_category`
pub fn record_token_validation(status: &'static str, error_category: Option<&'static str>) {
    let category = error_category.unwrap_or("none");
    counter!("auth_token_validations_total", "status" => status, "error_category" => category)
        .increment(1);
}

/// Record the outcome of a refresh call
///
/// Metric: `auth_token_refresh_total`
/// Labels: `outcome`
pub fn record_token_refresh(outcome: &'static str) {
    counter!("auth_token_refresh_total", "outcome" => outcome).increment(1);
}

// ============================================================================
// Client Metrics
// ============================================================================

/// Record a client credential validation
///
/// Metric: `auth_client_validations_total`
/// Labels: `status`
pub fn record_client_validation(status: &'static str) {
    counter!("auth_client_validations_total", "status" => status).increment(1);
}
