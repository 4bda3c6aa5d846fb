//! Bearer-token interceptor.
//!
//! Runs on every route. For non-exempt paths it reads
//! `Authorization: Bearer <token>`, validates the token, and on success
//! inserts an [`Identity`] into the request extensions. It never rejects:
//! a missing, malformed, expired or forged token just leaves the request
//! anonymous. Handlers that need a caller use the [`Authenticated`]
//! extractor, which turns an anonymous request into a 401.

use crate::errors::AuthError;
use crate::observability::hash_for_correlation;
use crate::services::token_service::TokenService;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use common::jwt::BEARER_PREFIX;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// Paths the interceptor skips entirely (exact match).
pub const EXEMPT_PATHS: [&str; 4] = ["/register", "/logout", "/api/refresh", "/api/login"];

/// Authenticated caller for the current request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub username: String,
    /// Always empty; role-based authorities are not issued.
    pub authorities: Vec<String>,
}

impl Identity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            authorities: Vec::new(),
        }
    }
}

pub fn is_exempt(path: &str) -> bool {
    EXEMPT_PATHS.contains(&path)
}

/// Bearer token from the `Authorization` header, if well-formed.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix(BEARER_PREFIX)?;
    if token.is_empty() {
        tracing::debug!(target: "auth.middleware.auth", "Empty bearer token");
        return None;
    }
    Some(token)
}

/// Identity for `headers`, or `None` if the request is anonymous.
pub fn resolve_identity(tokens: &TokenService, headers: &HeaderMap) -> Option<Identity> {
    let token = bearer_token(headers)?;

    match tokens.verify(token) {
        Ok(claims) if !claims.username.is_empty() => Some(Identity::new(claims.username)),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(
                target: "auth.middleware.auth",
                error_category = e.category(),
                "Bearer token rejected, continuing anonymously"
            );
            None
        }
    }
}

/// Interceptor middleware. Attach with `from_fn_with_state`.
#[instrument(skip_all, name = "auth.middleware.attach_identity")]
pub async fn attach_identity(
    State(tokens): State<Arc<TokenService>>,
    mut req: Request,
    next: Next,
) -> Response {
    if !is_exempt(req.uri().path()) {
        if let Some(identity) = resolve_identity(&tokens, req.headers()) {
            tracing::debug!(
                target: "auth.middleware.auth",
                user = %hash_for_correlation(&identity.username),
                "Request authenticated"
            );
            req.extensions_mut().insert(identity);
        }
    }

    next.run(req).await
}

/// Extractor for handlers that require a caller. Rejects with
/// `AuthError::Unauthenticated` (401) when no [`Identity`] was attached.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(Authenticated)
            .ok_or(AuthError::Unauthenticated)
    }
}
