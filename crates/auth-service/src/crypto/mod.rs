//! Cryptographic primitives: token signing, password hashing, and secret comparison.

pub mod codec;
pub mod signing_key;

use crate::config::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::errors::AuthError;
use base64::{engine::general_purpose, Engine as _};
use common::secret::SecretString;
use ring::{
    hmac,
    rand::{SecureRandom, SystemRandom},
};
use tracing::instrument;

/// Bcrypt hash of a throwaway value, verified against when a login names an
/// unknown user so that the response time matches a wrong-password attempt.
pub const DUMMY_BCRYPT_HASH: &str = "$2b$12$LQv3c1yqBWVHxkd0LHAkCOYz6TtxMQJqhN8/LewY5GyYqExt7YD3a";

/// Storage prefix marking a bcrypt-hashed client secret.
const BCRYPT_PREFIX: &str = "{bcrypt}";

/// Storage prefix marking a plain-text client secret.
const NOOP_PREFIX: &str = "{noop}";

/// Hash a password or client secret with bcrypt.
#[instrument(skip_all)]
pub fn hash_secret(secret: &str, cost: u32) -> Result<String, AuthError> {
    // Config already validates the cost; re-check for direct callers.
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
        return Err(AuthError::Crypto(format!(
            "Invalid bcrypt cost: {} (must be {}-{})",
            cost, MIN_BCRYPT_COST, MAX_BCRYPT_COST
        )));
    }

    bcrypt::hash(secret, cost).map_err(|e| AuthError::Crypto(format!("Hashing failed: {}", e)))
}

/// Verify a password or secret against a bcrypt hash.
#[instrument(skip_all)]
pub fn verify_hash(secret: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(secret, hash)
        .map_err(|e| AuthError::Crypto(format!("Hash verification failed: {}", e)))
}

/// Compare a presented client secret against its stored form.
///
/// Stored secrets are either bcrypt hashes (bare `$2a$`/`$2b$`/`$2y$` or
/// `{bcrypt}`-prefixed) or plain text (bare or `{noop}`-prefixed). Plain-text
/// comparison is constant-time.
#[instrument(skip_all)]
pub fn verify_client_secret(provided: &str, stored: &str) -> Result<bool, AuthError> {
    if let Some(hash) = stored.strip_prefix(BCRYPT_PREFIX) {
        return Ok(verify_stored_hash(provided, hash));
    }
    if is_bcrypt_hash(stored) {
        return Ok(verify_stored_hash(provided, stored));
    }

    let plain = stored.strip_prefix(NOOP_PREFIX).unwrap_or(stored);
    constant_time_eq(provided.as_bytes(), plain.as_bytes())
}

/// A stored hash that bcrypt cannot parse never matches.
fn verify_stored_hash(provided: &str, hash: &str) -> bool {
    verify_hash(provided, hash).unwrap_or_else(|e| {
        tracing::warn!(target: "auth.crypto", error = %e, "Stored client secret hash is corrupt");
        false
    })
}

fn is_bcrypt_hash(value: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"]
        .iter()
        .any(|prefix| value.starts_with(prefix))
}

/// Constant-time byte comparison.
///
/// Both inputs are MACed under a fresh random key and the tags are compared
/// with `hmac::verify`, so timing depends on neither content nor length.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> Result<bool, AuthError> {
    let rng = SystemRandom::new();
    let key = hmac::Key::generate(hmac::HMAC_SHA256, &rng)
        .map_err(|e| AuthError::Crypto(format!("HMAC key generation failed: {}", e)))?;

    let tag = hmac::sign(&key, b);
    Ok(hmac::verify(&key, a, tag.as_ref()).is_ok())
}

/// Generate cryptographically secure random bytes
pub fn generate_random_bytes(len: usize) -> Result<Vec<u8>, AuthError> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|e| AuthError::Crypto(format!("Random bytes generation failed: {}", e)))?;
    Ok(bytes)
}

/// Generate a client secret (32 bytes, base64url encoded).
///
/// Returned as a `SecretString`; callers must `.expose_secret()` to read it.
#[instrument(skip_all)]
pub fn generate_client_secret() -> Result<SecretString, AuthError> {
    let bytes = generate_random_bytes(32)?;
    Ok(SecretString::from(
        general_purpose::URL_SAFE_NO_PAD.encode(&bytes),
    ))
}
