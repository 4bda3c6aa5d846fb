//! E2E tests for the refresh flow.
//!
//! Refresh only inspects the access token: a live one returns the pair
//! unchanged, an expired one is re-issued if its user still exists.

use auth_service::models::TokenPair;
use auth_test_utils::*;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

async fn refresh(server: &TestAuthServer, pair: &TokenPair) -> reqwest::Result<reqwest::Response> {
    reqwest::Client::new()
        .post(format!("{}/api/refresh", server.url()))
        .json(pair)
        .send()
        .await
}

#[tokio::test]
async fn test_refresh_live_access_token_returns_same_pair() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.seed_user(TEST_USERNAME, TEST_EMAIL, TEST_PASSWORD).await?;
    let pair = server.login(TEST_USERNAME, TEST_PASSWORD).await?;

    let response = refresh(&server, &pair).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let refreshed: TokenPair = response.json().await?;
    assert_eq!(refreshed, pair);

    Ok(())
}

#[tokio::test]
async fn test_refresh_expired_access_token_issues_new_pair() -> Result<(), anyhow::Error> {
    let server =
        TestAuthServer::spawn_with_ttls(Duration::from_secs(1), Duration::from_secs(60)).await?;
    server.seed_user(TEST_USERNAME, TEST_EMAIL, TEST_PASSWORD).await?;
    let pair = server.login(TEST_USERNAME, TEST_PASSWORD).await?;

    tokio::time::sleep(Duration::from_millis(1_500)).await;

    let response = refresh(&server, &pair).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let refreshed: TokenPair = response.json().await?;
    assert_ne!(refreshed.access_token, pair.access_token);
    assert_ne!(refreshed.refresh_token, pair.refresh_token);
    refreshed
        .access_token
        .assert_valid_jwt()
        .assert_for_username(TEST_USERNAME)
        .assert_expires_in_ms(1_000);

    Ok(())
}

#[tokio::test]
async fn test_refresh_expired_token_for_deleted_user_returns_original_pair(
) -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let pair = TokenPair {
        access_token: TestClaimsBuilder::new()
            .for_user("ghost")
            .expired_ms_ago(5_000)
            .sign(TEST_JWT_SECRET),
        refresh_token: TestClaimsBuilder::new()
            .for_user("ghost")
            .sign(TEST_JWT_SECRET),
    };

    let response = refresh(&server, &pair).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let refreshed: TokenPair = response.json().await?;
    assert_eq!(refreshed, pair);

    Ok(())
}

#[tokio::test]
async fn test_refresh_forged_access_token_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.seed_user(TEST_USERNAME, TEST_EMAIL, TEST_PASSWORD).await?;
    let pair = TokenPair {
        access_token: TestClaimsBuilder::new()
            .for_user(TEST_USERNAME)
            .expired_ms_ago(5_000)
            .sign(FOREIGN_JWT_SECRET),
        refresh_token: TestClaimsBuilder::new()
            .for_user(TEST_USERNAME)
            .sign(FOREIGN_JWT_SECRET),
    };

    let response = refresh(&server, &pair).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");

    Ok(())
}
