//! Storage boundary for users and OAuth clients.
//!
//! Services depend on the traits only. `users` and `clients` hold the
//! PostgreSQL implementations; `memory` holds the in-process ones used when no
//! database is configured, and `mock` wraps those with call counting and
//! failure injection for tests.

pub mod clients;
pub mod memory;
pub mod mock;
pub mod users;

use crate::errors::AuthError;
use crate::models::{ClientRecord, NewUser, User};

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    /// Insert a new user. Duplicate username or email yields `AuthError::Conflict`.
    async fn create(&self, user: NewUser) -> Result<User, AuthError>;

    /// Persist `email` and `password_hash` for the user with `user.user_id`,
    /// refreshing `updated_at`.
    async fn update(&self, user: &User) -> Result<User, AuthError>;

    /// Returns `false` when no such user existed.
    async fn delete(&self, username: &str) -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait ClientRepository: Send + Sync {
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<ClientRecord>, AuthError>;

    async fn exists_by_client_id(&self, client_id: &str) -> Result<bool, AuthError>;

    /// Insert a new client. Duplicate `client_id` yields `AuthError::Conflict`.
    async fn create(&self, record: ClientRecord) -> Result<ClientRecord, AuthError>;

    /// Persist every mutable field of `record`, refreshing `updated_at`.
    async fn update(&self, record: &ClientRecord) -> Result<ClientRecord, AuthError>;
}

/// Map a sqlx error, turning unique-constraint violations into `Conflict`.
pub(crate) fn map_write_error(err: sqlx::Error, conflict: &str, context: &str) -> AuthError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AuthError::Conflict(conflict.to_string())
        }
        _ => AuthError::Database(format!("{}: {}", context, err)),
    }
}
