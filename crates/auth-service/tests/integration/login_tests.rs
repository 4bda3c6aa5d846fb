//! E2E tests for registration, login and own-account management.
//!
//! ## Test Naming
//!
//! Tests follow the convention: `test_<feature>_<scenario>_<expected_result>`

use auth_service::repositories::UserRepository;
use auth_test_utils::*;
use reqwest::StatusCode;
use serde_json::{json, Value};

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_happy_path_returns_profile() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = reqwest::Client::new()
        .post(format!("{}/register", server.url()))
        .json(&json!({
            "username": TEST_USERNAME,
            "email": TEST_EMAIL,
            "password": TEST_PASSWORD,
        }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await?;
    assert_eq!(body["username"], TEST_USERNAME);
    assert_eq!(body["email"], TEST_EMAIL);
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());

    Ok(())
}

#[tokio::test]
async fn test_register_duplicate_username_conflicts() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.seed_user(TEST_USERNAME, TEST_EMAIL, TEST_PASSWORD).await?;

    let response = reqwest::Client::new()
        .post(format!("{}/register", server.url()))
        .json(&json!({
            "username": TEST_USERNAME,
            "email": "someone-else@example.com",
            "password": TEST_PASSWORD,
        }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "CONFLICT");

    Ok(())
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_returns_token_pair() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.seed_user(TEST_USERNAME, TEST_EMAIL, TEST_PASSWORD).await?;

    let response = reqwest::Client::new()
        .post(format!("{}/api/login", server.url()))
        .json(&json!({ "username": TEST_USERNAME, "password": TEST_PASSWORD }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    let access = body["accessToken"].as_str().unwrap_or_default().to_string();
    let refresh = body["refreshToken"].as_str().unwrap_or_default().to_string();

    access
        .assert_valid_jwt()
        .assert_for_username(TEST_USERNAME)
        .assert_expires_in_ms(600_000);
    refresh
        .assert_valid_jwt()
        .assert_for_username(TEST_USERNAME)
        .assert_expires_in_ms(86_400_000);

    Ok(())
}

#[tokio::test]
async fn test_login_wrong_password_and_unknown_user_look_the_same() -> Result<(), anyhow::Error>
{
    let server = TestAuthServer::spawn().await?;
    server.seed_user(TEST_USERNAME, TEST_EMAIL, TEST_PASSWORD).await?;
    let client = reqwest::Client::new();

    let wrong_password = client
        .post(format!("{}/api/login", server.url()))
        .json(&json!({ "username": TEST_USERNAME, "password": "not-the-password" }))
        .send()
        .await?;
    let unknown_user = client
        .post(format!("{}/api/login", server.url()))
        .json(&json!({ "username": "nobody", "password": TEST_PASSWORD }))
        .send()
        .await?;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    let a: Value = wrong_password.json().await?;
    let b: Value = unknown_user.json().await?;
    assert_eq!(a, b);
    assert_eq!(a["error"]["code"], "INVALID_CREDENTIALS");

    Ok(())
}

// ============================================================================
// Own account
// ============================================================================

#[tokio::test]
async fn test_userinfo_returns_caller_profile() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.seed_user(TEST_USERNAME, TEST_EMAIL, TEST_PASSWORD).await?;
    let pair = server.login(TEST_USERNAME, TEST_PASSWORD).await?;

    let response = reqwest::Client::new()
        .get(format!("{}/userinfo", server.url()))
        .bearer_auth(&pair.access_token)
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["username"], TEST_USERNAME);
    assert_eq!(body["email"], TEST_EMAIL);

    Ok(())
}

#[tokio::test]
async fn test_update_own_email_then_delete_account() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.seed_user(TEST_USERNAME, TEST_EMAIL, TEST_PASSWORD).await?;
    let pair = server.login(TEST_USERNAME, TEST_PASSWORD).await?;
    let client = reqwest::Client::new();
    let url = format!("{}/api/users/{}", server.url(), TEST_USERNAME);

    let response = client
        .put(&url)
        .bearer_auth(&pair.access_token)
        .json(&json!({ "email": "john.doe@example.com" }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["email"], "john.doe@example.com");
    let stored = server.users().find_by_username(TEST_USERNAME).await?;
    assert_eq!(
        stored.map(|user| user.email).as_deref(),
        Some("john.doe@example.com")
    );

    let response = client
        .delete(&url)
        .bearer_auth(&pair.access_token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(server.users().find_by_username(TEST_USERNAME).await?.is_none());

    let response = client
        .get(&url)
        .bearer_auth(&pair.access_token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_logout_always_succeeds() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = reqwest::Client::new()
        .post(format!("{}/logout", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Logout successful");

    Ok(())
}
