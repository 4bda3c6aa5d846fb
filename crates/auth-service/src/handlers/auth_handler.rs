use crate::errors::AuthError;
use crate::models::{LoginRequest, RegisterRequest, TokenPair, UserProfile};
use crate::observability::hash_for_correlation;
use crate::routes::AppState;
use crate::services::user_service;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Handle user registration
///
/// POST /register
pub async fn handle_register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AuthError> {
    let profile =
        user_service::register_user(state.users.as_ref(), payload, state.config.bcrypt_cost)
            .await?;

    Ok((StatusCode::CREATED, Json(profile)))
}

/// Handle login
///
/// POST /api/login
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenPair>, AuthError> {
    let user =
        user_service::authenticate(state.users.as_ref(), &payload.username, &payload.password)
            .await?;

    let pair = state.tokens.generate_token_pair(&user)?;
    tracing::info!(
        target: "auth.handlers.auth",
        user = %hash_for_correlation(&user.username),
        "Login succeeded"
    );

    Ok(Json(pair))
}

/// Handle token refresh
///
/// POST /api/refresh
pub async fn handle_refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TokenPair>,
) -> Result<Json<TokenPair>, AuthError> {
    let pair = state.tokens.refresh(&payload).await?;
    Ok(Json(pair))
}

/// Handle logout
///
/// POST /logout
///
/// Tokens are not tracked server-side, so there is nothing to revoke; the
/// client discards its pair.
pub async fn handle_logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logout successful".to_string(),
    })
}
