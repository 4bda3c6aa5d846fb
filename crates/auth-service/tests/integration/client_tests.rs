//! E2E tests for client registration, update and credential validation.

use auth_test_utils::*;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn validate_basic(server: &TestAuthServer, id: &str, secret: &str) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/api/clients/validate", server.url()))
        .basic_auth(id, Some(secret))
        .send()
        .await
        .expect("request should reach the server")
}

#[tokio::test]
async fn test_validate_seeded_client_returns_descriptor() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.seed_client(test_client_record()).await?;

    let response = validate_basic(&server, TEST_CLIENT_ID, TEST_CLIENT_SECRET).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["client_id"], TEST_CLIENT_ID);
    assert_eq!(body["redirect_uris"], json!([TEST_REDIRECT_URI]));
    assert_eq!(body["scopes"], json!(["openid", "profile"]));
    assert_eq!(
        body["grant_types"],
        json!(["authorization_code", "refresh_token"])
    );
    assert_eq!(body["auth_methods"], json!(["client_secret_basic"]));
    assert_eq!(body["access_token_ttl_minutes"], 60);
    assert_eq!(body["refresh_token_ttl_minutes"], 1440);
    assert!(body.get("client_secret").is_none());

    Ok(())
}

#[tokio::test]
async fn test_validate_accepts_json_body() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.seed_client(test_client_record()).await?;

    let response = reqwest::Client::new()
        .post(format!("{}/api/clients/validate", server.url()))
        .json(&json!({ "client_id": TEST_CLIENT_ID, "client_secret": TEST_CLIENT_SECRET }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_validate_basic_auth_ignores_form_body() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.seed_client(test_client_record()).await?;

    let response = reqwest::Client::new()
        .post(format!("{}/api/clients/validate", server.url()))
        .basic_auth(TEST_CLIENT_ID, Some(TEST_CLIENT_SECRET))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("grant_type=client_credentials")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["client_id"], TEST_CLIENT_ID);

    Ok(())
}

#[tokio::test]
async fn test_validate_wrong_secret_and_unknown_client_look_the_same(
) -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.seed_client(test_client_record()).await?;

    let wrong_secret = validate_basic(&server, TEST_CLIENT_ID, "wrong-secret").await;
    let unknown = validate_basic(&server, "no-such-client", TEST_CLIENT_SECRET).await;

    assert_eq!(wrong_secret.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let a: Value = wrong_secret.json().await?;
    let b: Value = unknown.json().await?;
    assert_eq!(a, b);
    assert_eq!(a["error"]["code"], "INVALID_CLIENT");

    Ok(())
}

#[tokio::test]
async fn test_validate_without_credentials_is_bad_request() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = reqwest::Client::new()
        .post(format!("{}/api/clients/validate", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "INVALID_INPUT");

    Ok(())
}

#[tokio::test]
async fn test_register_client_requires_authentication() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = reqwest::Client::new()
        .post(format!("{}/api/clients", server.url()))
        .json(&json!({ "client_id": "new-client" }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_register_client_generates_secret_that_validates() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let token = server.access_token_for(TEST_USERNAME)?;

    let response = reqwest::Client::new()
        .post(format!("{}/api/clients", server.url()))
        .bearer_auth(&token)
        .json(&json!({
            "client_id": "new-client",
            "redirect_uris": ["https://app.example.com/callback"],
            "scopes": ["openid"],
            "grant_types": ["authorization_code"],
        }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await?;
    assert_eq!(body["client_id"], "new-client");
    let secret = body["client_secret"]
        .as_str()
        .expect("generated secret is returned once")
        .to_string();

    let response = validate_basic(&server, "new-client", &secret).await;
    assert_eq!(response.status(), StatusCode::OK);

    let duplicate = reqwest::Client::new()
        .post(format!("{}/api/clients", server.url()))
        .bearer_auth(&token)
        .json(&json!({ "client_id": "new-client" }))
        .send()
        .await?;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    Ok(())
}

#[tokio::test]
async fn test_update_client_changes_descriptor() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.seed_client(test_client_record()).await?;
    let token = server.access_token_for(TEST_USERNAME)?;

    let response = reqwest::Client::new()
        .put(format!("{}/api/clients/{}", server.url(), TEST_CLIENT_ID))
        .bearer_auth(&token)
        .json(&json!({
            "scopes": ["openid", "email"],
            "access_token_ttl_seconds": 90,
            "require_consent": false,
        }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["scopes"], json!(["email", "openid"]));
    assert_eq!(body["access_token_ttl_minutes"], 1);
    assert_eq!(body["require_consent"], false);

    let response = validate_basic(&server, TEST_CLIENT_ID, TEST_CLIENT_SECRET).await;
    let body: Value = response.json().await?;
    assert_eq!(body["access_token_ttl_minutes"], 1);

    Ok(())
}
