use crate::errors::AuthError;
use crate::middleware::auth::{Authenticated, Identity};
use crate::models::{UpdateUserRequest, UserProfile};
use crate::routes::AppState;
use crate::services::user_service;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

/// Only the account owner may act on `/api/users/:username`.
fn ensure_owner(identity: &Identity, username: &str) -> Result<(), AuthError> {
    if identity.username != username {
        return Err(AuthError::Forbidden(
            "Users may only access their own account".to_string(),
        ));
    }
    Ok(())
}

/// Profile of the caller
///
/// GET /userinfo
pub async fn handle_userinfo(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
) -> Result<Json<UserProfile>, AuthError> {
    let user = user_service::get_user(state.users.as_ref(), &identity.username).await?;
    Ok(Json(UserProfile::from(&user)))
}

/// GET /api/users/:username
pub async fn handle_get_user(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    Path(username): Path<String>,
) -> Result<Json<UserProfile>, AuthError> {
    ensure_owner(&identity, &username)?;
    let user = user_service::get_user(state.users.as_ref(), &username).await?;
    Ok(Json(UserProfile::from(&user)))
}

/// PUT /api/users/:username
pub async fn handle_update_user(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    Path(username): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserProfile>, AuthError> {
    ensure_owner(&identity, &username)?;
    let profile = user_service::update_user(
        state.users.as_ref(),
        &username,
        payload,
        state.config.bcrypt_cost,
    )
    .await?;
    Ok(Json(profile))
}

/// DELETE /api/users/:username
pub async fn handle_delete_user(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    Path(username): Path<String>,
) -> Result<StatusCode, AuthError> {
    ensure_owner(&identity, &username)?;
    user_service::delete_user(state.users.as_ref(), &username).await?;
    Ok(StatusCode::NO_CONTENT)
}
