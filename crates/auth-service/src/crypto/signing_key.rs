use crate::errors::AuthError;
use common::jwt::MIN_HMAC_KEY_BYTES;
use common::secret::{ExposeSecret, SecretString};
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::fmt;
use tracing::instrument;

/// HS256 key material derived from the configured signing secret.
///
/// Derived once at startup and shared read-only behind an `Arc`. A new secret
/// takes effect only after a restart.
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    /// Derive the key from the raw secret bytes.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the secret is empty or shorter
    /// than 256 bits.
    #[instrument(skip_all)]
    pub fn derive(secret: &SecretString) -> Result<Self, AuthError> {
        let bytes = secret.expose_secret().as_bytes();

        if bytes.is_empty() {
            return Err(AuthError::Configuration(
                "JWT signing secret is empty".to_string(),
            ));
        }
        if bytes.len() < MIN_HMAC_KEY_BYTES {
            return Err(AuthError::Configuration(format!(
                "JWT signing secret must be at least {} bytes, got {}",
                MIN_HMAC_KEY_BYTES,
                bytes.len()
            )));
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        })
    }

    pub(crate) fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &"HS256")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
