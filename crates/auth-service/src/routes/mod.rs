//! HTTP routes for the auth service.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers::{auth_handler, client_handler, metrics_handler, user_handler};
use crate::middleware::auth::attach_identity;
use crate::repositories::{ClientRepository, UserRepository};
use crate::services::token_service::TokenService;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Token issuance, verification and refresh.
    pub tokens: Arc<TokenService>,

    pub users: Arc<dyn UserRepository>,

    pub clients: Arc<dyn ClientRepository>,

    /// Service configuration.
    pub config: Config,
}

async fn health_check() -> &'static str {
    "OK"
}

/// Build the application routes.
///
/// - `/health` - Liveness probe
/// - `/metrics` - Prometheus scrape endpoint
/// - `/register`, `/api/login`, `/api/refresh`, `/logout` - exempt from the interceptor
/// - `/userinfo`, `/api/users/:username` - own account, bearer token required
/// - `/api/clients`, `/api/clients/:client_id` - client management, bearer token required
/// - `/api/clients/validate` - client credential check
///
/// The interceptor wraps every route and only attaches identities; handlers
/// that need a caller reject anonymous requests themselves.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let app_routes = Router::new()
        .route("/health", get(health_check))
        .route("/register", post(auth_handler::handle_register))
        .route("/api/login", post(auth_handler::handle_login))
        .route("/api/refresh", post(auth_handler::handle_refresh))
        .route("/logout", post(auth_handler::handle_logout))
        .route("/userinfo", get(user_handler::handle_userinfo))
        .route(
            "/api/users/:username",
            get(user_handler::handle_get_user)
                .put(user_handler::handle_update_user)
                .delete(user_handler::handle_delete_user),
        )
        .route("/api/clients", post(client_handler::handle_register_client))
        .route(
            "/api/clients/validate",
            post(client_handler::handle_validate_client),
        )
        .route(
            "/api/clients/:client_id",
            put(client_handler::handle_update_client),
        )
        .with_state(state.clone());

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(metrics_handler::metrics_handler))
        .with_state(metrics_handle);

    app_routes
        .merge(metrics_routes)
        .layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            attach_identity,
        ))
        .layer(TraceLayer::new_for_http())
}
