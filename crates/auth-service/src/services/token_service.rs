//! Token lifecycle: issue pairs, verify, detect expiry, refresh on expiry.
//!
//! No token state is kept server-side. A pair is valid for as long as its
//! signatures and `exp` claims say it is, and refresh re-derives everything
//! from the expired access token plus a fresh user lookup.

use crate::crypto::codec::{Claims, TokenCodec, TokenError};
use crate::errors::AuthError;
use crate::models::{TokenPair, User};
use crate::observability::hash_for_correlation;
use crate::observability::metrics::{
    record_token_issuance, record_token_refresh, record_token_validation,
};
use crate::repositories::UserRepository;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::instrument;

pub struct TokenService {
    codec: TokenCodec,
    access_ttl: Duration,
    refresh_ttl: Duration,
    users: Arc<dyn UserRepository>,
}

impl TokenService {
    pub fn new(
        codec: TokenCodec,
        access_ttl: Duration,
        refresh_ttl: Duration,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            codec,
            access_ttl,
            refresh_ttl,
            users,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Issue an access/refresh pair for `user`.
    ///
    /// Both tokens carry the same claims and differ only in `exp`.
    #[instrument(skip_all)]
    pub fn generate_token_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        let claims = Claims::new(user.username.clone(), Some(user.email.clone()));

        let access_token = self.sign("access", &claims, self.access_ttl)?;
        let refresh_token = self.sign("refresh", &claims, self.refresh_ttl)?;

        tracing::debug!(
            target: "auth.services.token",
            user = %hash_for_correlation(&user.username),
            "Issued token pair"
        );

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    fn sign(&self, kind: &'static str, claims: &Claims, ttl: Duration) -> Result<String, AuthError> {
        let start = Instant::now();
        let result = self.codec.encode(claims, ttl);
        let status = if result.is_ok() { "success" } else { "error" };
        record_token_issuance(kind, status, start.elapsed());
        result
    }

    /// Decode and verify a token, recording the outcome.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let result = self.codec.decode(token);
        match &result {
            Ok(_) => record_token_validation("success", None),
            Err(e) => record_token_validation("error", Some(e.category())),
        }
        result
    }

    /// Username from a live token.
    pub fn extract_username(&self, token: &str) -> Result<String, AuthError> {
        Ok(self.verify(token)?.username)
    }

    /// `true` iff the token is authentic but past its expiry.
    ///
    /// # Errors
    ///
    /// `AuthError::InvalidToken` when the token is malformed or its signature
    /// does not verify.
    pub fn is_expired(&self, token: &str) -> Result<bool, AuthError> {
        match self.verify(token) {
            Ok(_) => Ok(false),
            Err(TokenError::Expired(_)) => Ok(true),
            Err(e) => Err(e.into()),
        }
    }

    /// `true` iff the token is authentic, unexpired and names a user.
    pub fn validate(&self, token: &str) -> bool {
        self.verify(token)
            .map(|claims| !claims.username.is_empty())
            .unwrap_or(false)
    }

    /// Refresh a pair.
    ///
    /// - Live access token: the same pair comes back unchanged.
    /// - Expired access token: the user named in it is looked up again. If
    ///   found, a fresh pair is issued; if gone, the original pair comes back
    ///   unchanged.
    /// - Tampered or malformed access token: error.
    ///
    /// Only the access token is inspected.
    #[instrument(skip_all)]
    pub async fn refresh(&self, pair: &TokenPair) -> Result<TokenPair, AuthError> {
        let claims = match self.verify(&pair.access_token) {
            Ok(_) => {
                record_token_refresh("unchanged");
                return Ok(pair.clone());
            }
            Err(TokenError::Expired(claims)) => claims,
            Err(e) => {
                record_token_refresh("rejected");
                return Err(e.into());
            }
        };

        let user_hash = hash_for_correlation(&claims.username);
        match self.users.find_by_username(&claims.username).await? {
            Some(user) => {
                let renewed = self.generate_token_pair(&user)?;
                record_token_refresh("renewed");
                tracing::info!(target: "auth.services.token", user = %user_hash, "Refreshed token pair");
                Ok(renewed)
            }
            None => {
                record_token_refresh("user_missing");
                tracing::warn!(
                    target: "auth.services.token",
                    user = %user_hash,
                    "Refresh for unknown user, returning original pair"
                );
                Ok(pair.clone())
            }
        }
    }
}
