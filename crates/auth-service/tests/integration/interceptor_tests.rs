//! E2E tests for the bearer-token interceptor.
//!
//! The interceptor never rejects on its own; protected handlers answer 401
//! for anonymous callers and 403 for someone else's account.

use auth_test_utils::*;
use jsonwebtoken::Algorithm;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn userinfo_with(server: &TestAuthServer, auth: Option<String>) -> reqwest::Response {
    let mut request = reqwest::Client::new().get(format!("{}/userinfo", server.url()));
    if let Some(value) = auth {
        request = request.header("Authorization", value);
    }
    request.send().await.expect("request should reach the server")
}

#[tokio::test]
async fn test_protected_route_rejects_bad_tokens() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.seed_user(TEST_USERNAME, TEST_EMAIL, TEST_PASSWORD).await?;

    let cases = [
        None,
        Some("Bearer ".to_string()),
        Some("Bearer not.a.token".to_string()),
        Some(format!("Basic {}", server.access_token_for(TEST_USERNAME)?)),
        Some(format!(
            "Bearer {}",
            TestClaimsBuilder::new()
                .for_user(TEST_USERNAME)
                .expired_ms_ago(1_000)
                .sign(TEST_JWT_SECRET)
        )),
        Some(format!(
            "Bearer {}",
            TestClaimsBuilder::new()
                .for_user(TEST_USERNAME)
                .sign(FOREIGN_JWT_SECRET)
        )),
        Some(format!(
            "Bearer {}",
            TestClaimsBuilder::new()
                .for_user(TEST_USERNAME)
                .sign_with(Algorithm::HS512, TEST_JWT_SECRET)
        )),
        Some(format!(
            "Bearer {}",
            TestClaimsBuilder::new()
                .without_username()
                .sign(TEST_JWT_SECRET)
        )),
    ];

    for auth in cases {
        let response = userinfo_with(&server, auth.clone()).await;
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "expected 401 for {auth:?}"
        );
        let body: Value = response.json().await?;
        assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
    }

    Ok(())
}

#[tokio::test]
async fn test_protected_route_accepts_valid_token() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.seed_user(TEST_USERNAME, TEST_EMAIL, TEST_PASSWORD).await?;

    let response = userinfo_with(
        &server,
        Some(format!("Bearer {}", server.access_token_for(TEST_USERNAME)?)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_other_users_account_is_forbidden() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.seed_user(TEST_USERNAME, TEST_EMAIL, TEST_PASSWORD).await?;
    server.seed_user(OTHER_USERNAME, OTHER_EMAIL, TEST_PASSWORD).await?;
    let token = server.access_token_for(TEST_USERNAME)?;

    let response = reqwest::Client::new()
        .put(format!("{}/api/users/{}", server.url(), OTHER_USERNAME))
        .bearer_auth(&token)
        .json(&json!({ "email": "stolen@example.com" }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn test_exempt_route_ignores_garbage_token() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.seed_user(TEST_USERNAME, TEST_EMAIL, TEST_PASSWORD).await?;

    let response = reqwest::Client::new()
        .post(format!("{}/api/login", server.url()))
        .header("Authorization", "Bearer garbage")
        .json(&json!({ "username": TEST_USERNAME, "password": TEST_PASSWORD }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_health_and_metrics_are_public() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let health = reqwest::get(format!("{}/health", server.url())).await?;
    assert_eq!(health.status(), StatusCode::OK);

    let metrics = reqwest::get(format!("{}/metrics", server.url())).await?;
    assert_eq!(metrics.status(), StatusCode::OK);

    Ok(())
}
