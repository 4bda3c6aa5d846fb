//! JWT wire-format checks shared by the codec and the test utilities.
//!
//! Tokens travel as the compact serialization `header.payload.signature`, each
//! segment base64url-encoded without padding. This module performs the cheap
//! structural checks that run BEFORE any signature work:
//!
//! - size limit (tokens above [`MAX_JWT_SIZE_BYTES`] are rejected unparsed)
//! - exactly three non-empty segments
//! - header and payload segments decode to JSON objects
//!
//! Passing these checks says nothing about authenticity. The signature must
//! still be verified by the caller.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum accepted token size in bytes (8KB).
///
/// Issued tokens carry a username, an email and two timestamps, which keeps
/// them well under 512 bytes. Anything larger than this limit is rejected
/// before base64 decoding allocates.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Minimum HMAC-SHA256 key length in bytes (256 bits, RFC 7518 §3.2).
pub const MIN_HMAC_KEY_BYTES: usize = 32;

/// The `Authorization` header scheme prefix for bearer tokens.
pub const BEARER_PREFIX: &str = "Bearer ";

// =============================================================================
// Error Types
// =============================================================================

/// Structural problems found before signature verification.
///
/// Both variants share a generic message so callers can surface them without
/// leaking which check failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtShapeError {
    /// Token size exceeds [`MAX_JWT_SIZE_BYTES`].
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token is not three base64url segments carrying JSON header and payload.
    #[error("The access token is invalid or expired")]
    MalformedToken,
}

// =============================================================================
// Functions
// =============================================================================

/// Split a token into its three segments after the size check.
///
/// # Errors
///
/// - `TokenTooLarge` if the token exceeds [`MAX_JWT_SIZE_BYTES`]
/// - `MalformedToken` if there are not exactly three non-empty segments
pub fn split_segments(token: &str) -> Result<[&str; 3], JwtShapeError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtShapeError::TokenTooLarge);
    }

    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None)
            if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
        {
            Ok([header, payload, signature])
        }
        _ => {
            tracing::debug!(target: "common.jwt", "Token rejected: invalid JWT format");
            Err(JwtShapeError::MalformedToken)
        }
    }
}

/// Decode one base64url segment into a JSON object.
///
/// # Errors
///
/// Returns `MalformedToken` if the segment is not base64url or does not hold
/// a JSON object.
pub fn decode_segment(segment: &str) -> Result<serde_json::Map<String, serde_json::Value>, JwtShapeError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT segment base64");
        JwtShapeError::MalformedToken
    })?;

    match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => {
            tracing::debug!(target: "common.jwt", "JWT segment is not a JSON object");
            Err(JwtShapeError::MalformedToken)
        }
        Err(e) => {
            tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT segment JSON");
            Err(JwtShapeError::MalformedToken)
        }
    }
}

/// Run every structural check on a token without verifying its signature.
///
/// # Errors
///
/// Returns a [`JwtShapeError`] describing the first failed check.
pub fn check_shape(token: &str) -> Result<(), JwtShapeError> {
    let [header, payload, _signature] = split_segments(token)?;
    decode_segment(header)?;
    decode_segment(payload)?;
    Ok(())
}

/// Read the `alg` field from a token header without verifying anything.
///
/// Returns `None` when the token is malformed or the header has no string `alg`.
#[must_use]
pub fn peek_algorithm(token: &str) -> Option<String> {
    let [header, _, _] = split_segments(token).ok()?;
    decode_segment(header)
        .ok()?
        .get("alg")
        .and_then(|v| v.as_str())
        .map(ToString::to_string)
}

// =============================================================================
// Tests
// =============================================================================
