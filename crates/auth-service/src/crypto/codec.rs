//! HS256 token codec.
//!
//! Converts [`Claims`] to and from the JWT compact serialization. Timestamps in
//! the payload (`iat`, `exp`) are epoch milliseconds, so expiry is checked by
//! the codec itself rather than by `jsonwebtoken`'s second-granularity
//! validation.
//!
//! Decoding order:
//!
//! 1. Size and shape checks (`common::jwt`), before any crypto work
//! 2. Signature verification (HS256 only)
//! 3. Structural checks (`exp` present, `username` non-empty)
//! 4. Expiry: `exp <= now` yields [`TokenError::Expired`] carrying the
//!    verified claims, so callers can still act on who the token was for

use crate::crypto::signing_key::SigningKey;
use crate::errors::AuthError;
use common::jwt::{self, JwtShapeError};
use common::secret::SecretString;
use jsonwebtoken::{errors::ErrorKind, Algorithm, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

/// Claim names owned by [`Claims`] fields; never accepted as extension keys.
const RESERVED_CLAIMS: [&str; 4] = ["username", "email", "iat", "exp"];

/// Token payload.
///
/// `username` and `email` identify a user, so `Debug` redacts both.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Issued at (epoch millis)
    #[serde(default)]
    pub iat: i64,
    /// Expires at (epoch millis), stamped by [`TokenCodec::encode`]
    pub exp: i64,
    /// Optional claims outside the fixed set, flattened into the payload.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Claims {
    /// Claims for `username` issued now. `exp` is filled in at encode time.
    pub fn new(username: impl Into<String>, email: Option<String>) -> Self {
        Self {
            username: username.into(),
            email,
            iat: now_millis(),
            exp: 0,
            extra: BTreeMap::new(),
        }
    }

    /// Add an extension claim. Returns `false` (and stores nothing) when `key`
    /// collides with a fixed claim.
    pub fn insert_extra(&mut self, key: impl Into<String>, value: serde_json::Value) -> bool {
        let key = key.into();
        if RESERVED_CLAIMS.contains(&key.as_str()) {
            return false;
        }
        self.extra.insert(key, value);
        true
    }
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("username", &"[REDACTED]")
            .field("email", &self.email.as_ref().map(|_| "[REDACTED]"))
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .field("extra_keys", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token exceeds maximum size")]
    TooLarge,

    #[error("Token is malformed")]
    Malformed,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token has no username claim")]
    MissingUsername,

    /// Signature and structure are valid but the token is past `exp`.
    #[error("Token has expired")]
    Expired(Box<Claims>),
}

impl TokenError {
    /// Bounded label for metrics.
    pub fn category(&self) -> &'static str {
        match self {
            TokenError::TooLarge => "too_large",
            TokenError::Malformed => "malformed",
            TokenError::InvalidSignature => "signature_invalid",
            TokenError::MissingUsername => "missing_username",
            TokenError::Expired(_) => "expired",
        }
    }
}

impl From<JwtShapeError> for TokenError {
    fn from(err: JwtShapeError) -> Self {
        match err {
            JwtShapeError::TokenTooLarge => TokenError::TooLarge,
            JwtShapeError::MalformedToken => TokenError::Malformed,
        }
    }
}

/// Current time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Clone, Debug)]
pub struct TokenCodec {
    key: Arc<SigningKey>,
}

impl TokenCodec {
    pub fn new(key: Arc<SigningKey>) -> Self {
        Self { key }
    }

    /// Derive a signing key from `secret` and wrap it in a codec.
    pub fn from_secret(secret: &SecretString) -> Result<Self, AuthError> {
        Ok(Self::new(Arc::new(SigningKey::derive(secret)?)))
    }

    /// Sign `claims` with `exp = iat + ttl`.
    #[instrument(skip_all)]
    pub fn encode(&self, claims: &Claims, ttl: Duration) -> Result<String, AuthError> {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let mut stamped = claims.clone();
        stamped.exp = stamped.iat.saturating_add(ttl_ms);

        let header = Header::new(Algorithm::HS256);
        jsonwebtoken::encode(&header, &stamped, self.key.encoding())
            .map_err(|e| AuthError::Crypto(format!("JWT signing operation failed: {}", e)))
    }

    /// Verify and decode a token against the current time.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_at(token, now_millis())
    }

    /// Verify and decode a token as of `now_ms` (epoch millis).
    #[instrument(skip_all)]
    pub fn decode_at(&self, token: &str, now_ms: i64) -> Result<Claims, TokenError> {
        jwt::check_shape(token)?;

        let data = jsonwebtoken::decode::<Claims>(token, self.key.decoding(), &validation())
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => {
                    tracing::debug!(target: "auth.crypto.codec", "Token signature rejected");
                    TokenError::InvalidSignature
                }
                ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                    tracing::debug!(
                        target: "auth.crypto.codec",
                        alg = ?jwt::peek_algorithm(token),
                        "Token algorithm rejected"
                    );
                    TokenError::InvalidSignature
                }
                _ => {
                    tracing::debug!(target: "auth.crypto.codec", error = %e, "Token payload rejected");
                    TokenError::Malformed
                }
            })?;

        let claims = data.claims;
        if claims.username.trim().is_empty() {
            return Err(TokenError::MissingUsername);
        }

        if claims.exp <= now_ms {
            tracing::debug!(
                target: "auth.crypto.codec",
                expired_for_ms = now_ms.saturating_sub(claims.exp),
                "Token expired"
            );
            return Err(TokenError::Expired(Box::new(claims)));
        }

        Ok(claims)
    }
}

/// Signature-only validation. Expiry is handled in milliseconds by the codec,
/// and no registered claims (`sub`, `aud`, `nbf`) are required.
fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();
    validation
}
