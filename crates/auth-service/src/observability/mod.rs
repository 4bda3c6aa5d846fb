//! Observability for the auth service.
//!
//! Instrumentation uses `#[instrument(skip_all)]` and lists safe fields
//! explicitly. Field handling:
//! - **SAFE**: logged as-is (outcomes, error categories, durations)
//! - **HASHED**: logged only through [`hash_for_correlation`] (usernames, client ids)
//! - **NEVER**: passwords, client secrets, tokens, the signing secret

pub mod metrics;

use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars)
///
/// One-way and truncated: enough to follow one user or client across log
/// lines without writing the identifier itself.
pub fn hash_for_correlation(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    hex::encode(result.get(..4).unwrap_or_default())
}
