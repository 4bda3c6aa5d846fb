//! Custom test assertions for expressive tests
//!
//! Provides trait-based assertions over issued tokens. They inspect the
//! payload without verifying the signature; signature checks belong to the
//! codec tests.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

/// JWT header structure
#[derive(Debug, Deserialize)]
struct JwtHeader {
    pub alg: String,
    #[serde(default)]
    pub typ: Option<String>,
}

fn segment(token: &str, index: usize) -> Vec<u8> {
    let parts: Vec<_> = token.split('.').collect();
    assert_eq!(
        parts.len(),
        3,
        "JWT must have 3 parts (header.payload.signature), got {}",
        parts.len()
    );
    URL_SAFE_NO_PAD
        .decode(parts[index])
        .unwrap_or_else(|e| panic!("Failed to base64 decode JWT segment {index}: {e}"))
}

fn payload(token: &str) -> Value {
    serde_json::from_slice(&segment(token, 1)).expect("Failed to parse JWT claims")
}

/// Custom assertions for issued tokens
///
/// # Example
/// ```rust,ignore
/// pair.access_token
///     .assert_valid_jwt()
///     .assert_for_username("john_doe")
///     .assert_expires_in_ms(600_000);
/// ```
pub trait TokenAssertions {
    /// Assert that the token is an HS256 JWT with a JSON payload
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert that the token's `username` claim matches
    fn assert_for_username(&self, username: &str) -> &Self;

    /// Assert that the token expires within `ms` milliseconds of now
    /// (one second tolerance)
    fn assert_expires_in_ms(&self, ms: i64) -> &Self;

    /// Assert that the payload carries `claim`
    fn assert_has_claim(&self, claim: &str) -> &Self;
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        let header: JwtHeader =
            serde_json::from_slice(&segment(self, 0)).expect("Failed to parse JWT header JSON");
        assert_eq!(header.alg, "HS256", "Expected HS256 algorithm");
        if let Some(typ) = header.typ {
            assert_eq!(typ, "JWT", "Expected JWT type");
        }

        assert!(payload(self).is_object(), "JWT payload must be a JSON object");
        self
    }

    fn assert_for_username(&self, username: &str) -> &Self {
        let claims = payload(self);
        assert_eq!(
            claims["username"], username,
            "Expected username '{}', got {}",
            username, claims["username"]
        );
        self
    }

    fn assert_expires_in_ms(&self, ms: i64) -> &Self {
        let claims = payload(self);
        let exp = claims["exp"].as_i64().expect("exp must be an integer");
        let expires_in = exp - Utc::now().timestamp_millis();

        assert!(
            (expires_in - ms).abs() <= 1_000,
            "Expected token to expire in {} ms, but expires in {} ms",
            ms,
            expires_in
        );
        self
    }

    fn assert_has_claim(&self, claim: &str) -> &Self {
        let claims = payload(self);
        assert!(
            claims.get(claim).is_some(),
            "Token does not contain claim '{}'. Payload: {}",
            claim,
            claims
        );
        self
    }
}
