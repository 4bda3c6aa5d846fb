//! Builder for hand-signed test tokens
//!
//! Produces payloads the service would never issue itself: expired tokens,
//! tokens signed with another key, tokens missing claims.

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};

/// Builder for JWT claims in the service's payload format (millisecond
/// `iat`/`exp`, `username`, optional `email`).
///
/// # Example
/// ```rust,ignore
/// let token = TestClaimsBuilder::new()
///     .for_user("john_doe")
///     .expired_ms_ago(5_000)
///     .sign(TEST_JWT_SECRET);
/// ```
pub struct TestClaimsBuilder {
    username: Option<String>,
    email: Option<String>,
    iat: i64,
    exp: Option<i64>,
    extra: Map<String, Value>,
}

impl TestClaimsBuilder {
    /// Defaults: `test-user`, issued now, expiring in one hour.
    pub fn new() -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            username: Some("test-user".to_string()),
            email: None,
            iat: now,
            exp: Some(now + 3_600_000),
            extra: Map::new(),
        }
    }

    pub fn for_user(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    /// Drop the `username` claim entirely.
    pub fn without_username(mut self) -> Self {
        self.username = None;
        self
    }

    /// Drop the `exp` claim entirely.
    pub fn without_expiry(mut self) -> Self {
        self.exp = None;
        self
    }

    /// Expire `ms` milliseconds from now.
    pub fn expires_in_ms(mut self, ms: i64) -> Self {
        self.exp = Some(Utc::now().timestamp_millis() + ms);
        self
    }

    /// Expired `ms` milliseconds ago; issued one hour before that.
    pub fn expired_ms_ago(mut self, ms: i64) -> Self {
        let exp = Utc::now().timestamp_millis() - ms;
        self.exp = Some(exp);
        self.iat = exp - 3_600_000;
        self
    }

    pub fn with_claim(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    /// Build the claims as a JSON value
    pub fn build(self) -> Value {
        let mut claims = self.extra;
        claims.insert("iat".to_string(), json!(self.iat));
        if let Some(username) = self.username {
            claims.insert("username".to_string(), json!(username));
        }
        if let Some(email) = self.email {
            claims.insert("email".to_string(), json!(email));
        }
        if let Some(exp) = self.exp {
            claims.insert("exp".to_string(), json!(exp));
        }
        Value::Object(claims)
    }

    /// Sign with HS256 under `secret`.
    pub fn sign(self, secret: &str) -> String {
        self.sign_with(Algorithm::HS256, secret)
    }

    /// Sign with any HMAC algorithm under `secret`.
    pub fn sign_with(self, algorithm: Algorithm, secret: &str) -> String {
        jsonwebtoken::encode(
            &Header::new(algorithm),
            &self.build(),
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("HMAC signing should not fail")
    }
}

impl Default for TestClaimsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creates_valid_claims() {
        let claims = TestClaimsBuilder::new()
            .for_user("john_doe")
            .with_email("john@example.com")
            .build();

        assert_eq!(claims["username"], "john_doe");
        assert_eq!(claims["email"], "john@example.com");
        assert!(claims["exp"].as_i64().unwrap() > claims["iat"].as_i64().unwrap());
    }

    #[test]
    fn test_builder_expired() {
        let claims = TestClaimsBuilder::new().expired_ms_ago(1_000).build();
        assert!(claims["exp"].as_i64().unwrap() < Utc::now().timestamp_millis());
    }

    #[test]
    fn test_builder_can_omit_claims() {
        let claims = TestClaimsBuilder::new()
            .without_username()
            .without_expiry()
            .build();

        assert!(claims.get("username").is_none());
        assert!(claims.get("exp").is_none());
        assert!(claims.get("iat").is_some());
    }
}
