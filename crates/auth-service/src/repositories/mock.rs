//! Repository mocks for tests.
//!
//! Each mock delegates to the in-memory repository and counts lookups, so a
//! test can assert that a code path did (or did not) reach storage.

use super::memory::{InMemoryClientRepository, InMemoryUserRepository};
use super::{ClientRepository, UserRepository};
use crate::errors::AuthError;
use crate::models::{ClientRecord, NewUser, User};
use std::sync::atomic::{AtomicUsize, Ordering};

/// User repository mock with lookup counting and optional failure.
#[derive(Default)]
pub struct MockUserRepository {
    inner: InMemoryUserRepository,
    lookups: AtomicUsize,
    return_error: bool,
}

impl MockUserRepository {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that returns the given users.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            inner: InMemoryUserRepository::with_users(users),
            ..Self::default()
        }
    }

    /// Create a mock whose every call fails with a database error.
    pub fn failing() -> Self {
        Self {
            return_error: true,
            ..Self::default()
        }
    }

    /// Number of `find_by_*` calls made.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), AuthError> {
        if self.return_error {
            return Err(AuthError::Database("Mock user repository error".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.find_by_username(username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.find_by_email(email).await
    }

    async fn create(&self, user: NewUser) -> Result<User, AuthError> {
        self.check()?;
        self.inner.create(user).await
    }

    async fn update(&self, user: &User) -> Result<User, AuthError> {
        self.check()?;
        self.inner.update(user).await
    }

    async fn delete(&self, username: &str) -> Result<bool, AuthError> {
        self.check()?;
        self.inner.delete(username).await
    }
}

/// Client repository mock with lookup counting.
#[derive(Default)]
pub struct MockClientRepository {
    inner: InMemoryClientRepository,
    lookups: AtomicUsize,
}

impl MockClientRepository {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that returns the given clients.
    pub fn with_clients(records: impl IntoIterator<Item = ClientRecord>) -> Self {
        Self {
            inner: InMemoryClientRepository::with_clients(records),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Number of `find_by_client_id`/`exists_by_client_id` calls made.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ClientRepository for MockClientRepository {
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<ClientRecord>, AuthError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_client_id(client_id).await
    }

    async fn exists_by_client_id(&self, client_id: &str) -> Result<bool, AuthError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.exists_by_client_id(client_id).await
    }

    async fn create(&self, record: ClientRecord) -> Result<ClientRecord, AuthError> {
        self.inner.create(record).await
    }

    async fn update(&self, record: &ClientRecord) -> Result<ClientRecord, AuthError> {
        self.inner.update(record).await
    }
}
