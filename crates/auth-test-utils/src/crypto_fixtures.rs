//! Deterministic cryptographic fixtures for testing
//!
//! Fixed HMAC secrets plus pre-hashed users and clients.

use crate::test_ids::*;
use auth_service::config::MIN_BCRYPT_COST;
use auth_service::crypto::{self, codec::TokenCodec};
use auth_service::models::{ClientRecord, User};
use chrono::Utc;
use common::secret::SecretString;

/// Signing secret the test server is configured with (34 bytes).
pub const TEST_JWT_SECRET: &str = "supersecretkeysupersecretkey123456";

/// A different, equally valid secret. Tokens signed with it must be rejected.
pub const FOREIGN_JWT_SECRET: &str = "anothersecretanothersecretanother1";

pub fn test_jwt_secret() -> SecretString {
    SecretString::from(TEST_JWT_SECRET)
}

/// Codec over [`TEST_JWT_SECRET`].
pub fn test_codec() -> TokenCodec {
    TokenCodec::from_secret(&test_jwt_secret()).expect("test secret is long enough")
}

/// A stored user with a bcrypt hash of `password` at the lowest allowed cost.
pub fn test_user(user_id: uuid::Uuid, username: &str, email: &str, password: &str) -> User {
    let now = Utc::now();
    User {
        user_id,
        username: username.to_string(),
        email: email.to_string(),
        password_hash: crypto::hash_secret(password, MIN_BCRYPT_COST).expect("hash password"),
        created_at: now,
        updated_at: now,
    }
}

/// `john_doe` / `john@example.com` / `password123`.
pub fn john_doe() -> User {
    test_user(TEST_USER_JOHN, TEST_USERNAME, TEST_EMAIL, TEST_PASSWORD)
}

/// `test-client` with a bcrypt-hashed [`TEST_CLIENT_SECRET`], one redirect
/// URI, two scopes and the authorization code grant.
pub fn test_client_record() -> ClientRecord {
    let hash = crypto::hash_secret(TEST_CLIENT_SECRET, MIN_BCRYPT_COST).expect("hash secret");
    let mut record = ClientRecord::new(TEST_CLIENT_ID, format!("{{bcrypt}}{hash}"));
    record.record_id = TEST_CLIENT_RECORD_1;
    record.client_name = Some("Test Client".to_string());
    record.redirect_uris = Some(TEST_REDIRECT_URI.to_string());
    record.scopes = Some("openid profile".to_string());
    record.grant_types = Some("authorization_code,refresh_token".to_string());
    record
}
