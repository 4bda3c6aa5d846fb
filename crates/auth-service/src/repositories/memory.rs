//! In-process repositories backed by `tokio::sync::RwLock<HashMap>`.
//!
//! Same uniqueness rules as the PostgreSQL schema. Contents are lost on restart.

use crate::errors::AuthError;
use crate::models::{ClientRecord, NewUser, User};
use crate::repositories::{ClientRepository, UserRepository};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Users keyed by username.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-seeded with `users`.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users
            .into_iter()
            .map(|u| (u.username.clone(), u))
            .collect();
        Self {
            users: RwLock::new(users),
        }
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, AuthError> {
        let mut users = self.users.write().await;

        if users.contains_key(&user.username) || users.values().any(|u| u.email == user.email) {
            return Err(AuthError::Conflict(
                "Username or email is already registered".to_string(),
            ));
        }

        let now = Utc::now();
        let created = User {
            user_id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.username.clone(), created.clone());

        Ok(created)
    }

    async fn update(&self, user: &User) -> Result<User, AuthError> {
        let mut users = self.users.write().await;

        if users
            .values()
            .any(|u| u.user_id != user.user_id && u.email == user.email)
        {
            return Err(AuthError::Conflict(
                "Email is already registered".to_string(),
            ));
        }

        let stored = users
            .values_mut()
            .find(|u| u.user_id == user.user_id)
            .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;

        stored.email = user.email.clone();
        stored.password_hash = user.password_hash.clone();
        stored.updated_at = Utc::now();

        Ok(stored.clone())
    }

    async fn delete(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self.users.write().await.remove(username).is_some())
    }
}

/// Clients keyed by `client_id`.
#[derive(Default)]
pub struct InMemoryClientRepository {
    clients: RwLock<HashMap<String, ClientRecord>>,
}

impl InMemoryClientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-seeded with `records`.
    pub fn with_clients(records: impl IntoIterator<Item = ClientRecord>) -> Self {
        let clients = records
            .into_iter()
            .map(|r| (r.client_id.clone(), r))
            .collect();
        Self {
            clients: RwLock::new(clients),
        }
    }
}

#[async_trait::async_trait]
impl ClientRepository for InMemoryClientRepository {
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<ClientRecord>, AuthError> {
        Ok(self.clients.read().await.get(client_id).cloned())
    }

    async fn exists_by_client_id(&self, client_id: &str) -> Result<bool, AuthError> {
        Ok(self.clients.read().await.contains_key(client_id))
    }

    async fn create(&self, record: ClientRecord) -> Result<ClientRecord, AuthError> {
        let mut clients = self.clients.write().await;

        if clients.contains_key(&record.client_id) {
            return Err(AuthError::Conflict(
                "Client id is already registered".to_string(),
            ));
        }

        clients.insert(record.client_id.clone(), record.clone());
        Ok(record)
    }

    async fn update(&self, record: &ClientRecord) -> Result<ClientRecord, AuthError> {
        let mut clients = self.clients.write().await;

        let stored = clients
            .get_mut(&record.client_id)
            .ok_or_else(|| AuthError::NotFound("Client not found".to_string()))?;

        let created_at = stored.created_at;
        let record_id = stored.record_id;
        *stored = record.clone();
        stored.record_id = record_id;
        stored.created_at = created_at;
        stored.updated_at = Utc::now();

        Ok(stored.clone())
    }
}
