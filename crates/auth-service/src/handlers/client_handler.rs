use crate::errors::AuthError;
use crate::middleware::auth::Authenticated;
use crate::models::{ClientDescriptor, ClientUpdate, RegisterClientRequest, RegisterClientResponse};
use crate::observability::hash_for_correlation;
use crate::routes::AppState;
use crate::services::client_service;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use common::secret::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct ClientCredentialsRequest {
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
}

/// Register a client
///
/// POST /api/clients
pub async fn handle_register_client(
    State(state): State<Arc<AppState>>,
    Authenticated(identity): Authenticated,
    Json(payload): Json<RegisterClientRequest>,
) -> Result<(StatusCode, Json<RegisterClientResponse>), AuthError> {
    tracing::info!(
        target: "auth.handlers.client",
        user = %hash_for_correlation(&identity.username),
        "Client registration requested"
    );

    let response = client_service::register_client(
        state.clients.as_ref(),
        payload,
        state.config.bcrypt_cost,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Update a client's policy
///
/// PUT /api/clients/:client_id
pub async fn handle_update_client(
    State(state): State<Arc<AppState>>,
    Authenticated(_identity): Authenticated,
    Path(client_id): Path<String>,
    Json(payload): Json<ClientUpdate>,
) -> Result<Json<ClientDescriptor>, AuthError> {
    let descriptor =
        client_service::update_client(state.clients.as_ref(), &client_id, payload).await?;
    Ok(Json(descriptor))
}

/// Validate client credentials
///
/// POST /api/clients/validate
///
/// Accepts credentials via:
/// - HTTP Basic Auth (preferred)
/// - Request body (client_id, client_secret)
pub async fn handle_validate_client(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ClientDescriptor>, AuthError> {
    let payload = parse_credentials_body(&headers, &body)?;
    let (client_id, client_secret) = extract_client_credentials(&headers, payload)?;

    let descriptor = client_service::validate_client(
        state.clients.as_ref(),
        &client_id,
        client_secret.expose_secret(),
    )
    .await?;

    Ok(Json(descriptor))
}

/// Parse the JSON credentials body.
///
/// With a Basic header the body is not consulted, so any content type is
/// accepted (e.g. a form-encoded `grant_type=client_credentials`).
pub fn parse_credentials_body(
    headers: &HeaderMap,
    body: &[u8],
) -> Result<ClientCredentialsRequest, AuthError> {
    if body.is_empty() || has_basic_auth(headers) {
        return Ok(ClientCredentialsRequest::default());
    }

    serde_json::from_slice(body)
        .map_err(|e| AuthError::InvalidInput(format!("Invalid request body: {}", e)))
}

fn has_basic_auth(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("Basic "))
}

/// Extract client credentials from Basic Auth header or request body.
///
/// Missing values come back empty and are rejected by validation.
pub fn extract_client_credentials(
    headers: &HeaderMap,
    payload: ClientCredentialsRequest,
) -> Result<(String, SecretString), AuthError> {
    if let Some(auth_header) = headers.get(AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| malformed_basic_auth())?;

        if let Some(basic_auth) = auth_str.strip_prefix("Basic ") {
            let decoded = general_purpose::STANDARD
                .decode(basic_auth.trim())
                .map_err(|_| malformed_basic_auth())?;

            let credentials = String::from_utf8(decoded).map_err(|_| malformed_basic_auth())?;

            return match credentials.split_once(':') {
                Some((id, secret)) => Ok((id.to_string(), SecretString::from(secret.to_string()))),
                None => Err(malformed_basic_auth()),
            };
        }
    }

    Ok((
        payload.client_id.unwrap_or_default(),
        payload
            .client_secret
            .unwrap_or_else(|| SecretString::from(String::new())),
    ))
}

fn malformed_basic_auth() -> AuthError {
    AuthError::InvalidInput("Malformed Basic authorization header".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn basic(id: &str, secret: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let encoded = general_purpose::STANDARD.encode(format!("{id}:{secret}"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {encoded}")).expect("header"),
        );
        headers
    }

    #[test]
    fn test_extract_from_basic_auth() {
        let (id, secret) =
            extract_client_credentials(&basic("test-client", "test-secret"), Default::default())
                .expect("credentials");

        assert_eq!(id, "test-client");
        assert_eq!(secret.expose_secret(), "test-secret");
    }

    #[test]
    fn test_basic_auth_secret_may_contain_colon() {
        let (id, secret) =
            extract_client_credentials(&basic("test-client", "a:b:c"), Default::default())
                .expect("credentials");

        assert_eq!(id, "test-client");
        assert_eq!(secret.expose_secret(), "a:b:c");
    }

    #[test]
    fn test_extract_from_body() {
        let payload = ClientCredentialsRequest {
            client_id: Some("test-client".to_string()),
            client_secret: Some(SecretString::from("test-secret")),
        };

        let (id, secret) =
            extract_client_credentials(&HeaderMap::new(), payload).expect("credentials");
        assert_eq!(id, "test-client");
        assert_eq!(secret.expose_secret(), "test-secret");
    }

    #[test]
    fn test_missing_credentials_are_empty() {
        let (id, secret) =
            extract_client_credentials(&HeaderMap::new(), Default::default()).expect("credentials");
        assert!(id.is_empty());
        assert!(secret.expose_secret().is_empty());
    }

    #[test]
    fn test_form_body_ignored_with_basic_auth() {
        let headers = basic("test-client", "test-secret");
        let payload =
            parse_credentials_body(&headers, b"grant_type=client_credentials").expect("body");

        let (id, secret) = extract_client_credentials(&headers, payload).expect("credentials");
        assert_eq!(id, "test-client");
        assert_eq!(secret.expose_secret(), "test-secret");
    }

    #[test]
    fn test_non_json_body_without_basic_auth_rejected() {
        assert!(matches!(
            parse_credentials_body(&HeaderMap::new(), b"grant_type=client_credentials"),
            Err(AuthError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_json_body_parsed_without_basic_auth() {
        let payload = parse_credentials_body(
            &HeaderMap::new(),
            br#"{"client_id":"test-client","client_secret":"test-secret"}"#,
        )
        .expect("body");

        assert_eq!(payload.client_id.as_deref(), Some("test-client"));
    }

    #[test]
    fn test_malformed_basic_auth() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic !!!notbase64"));
        assert!(matches!(
            extract_client_credentials(&headers, Default::default()),
            Err(AuthError::InvalidInput(_))
        ));

        let no_colon = general_purpose::STANDARD.encode("just-an-id");
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {no_colon}")).expect("header"),
        );
        assert!(matches!(
            extract_client_credentials(&headers, Default::default()),
            Err(AuthError::InvalidInput(_))
        ));
    }
}
