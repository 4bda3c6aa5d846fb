//! PostgreSQL OAuth client repository.

use crate::errors::AuthError;
use crate::models::ClientRecord;
use crate::repositories::{map_write_error, ClientRepository};
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgClientRepository {
    pool: PgPool,
}

impl PgClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ClientRepository for PgClientRepository {
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<ClientRecord>, AuthError> {
        let record = sqlx::query_as::<_, ClientRecord>(
            r#"
            SELECT
                record_id, client_id, client_secret, client_name, client_description,
                redirect_uris, scopes, grant_types, auth_methods,
                access_token_ttl_seconds, refresh_token_ttl_seconds,
                require_proof_key, require_consent, reuse_refresh_tokens,
                created_at, updated_at
            FROM oauth2_clients
            WHERE client_id = $1
            "#,
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Database(format!("Failed to fetch client: {}", e)))?;

        Ok(record)
    }

    async fn exists_by_client_id(&self, client_id: &str) -> Result<bool, AuthError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(SELECT 1 FROM oauth2_clients WHERE client_id = $1)
            "#,
        )
        .bind(client_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AuthError::Database(format!("Failed to check client existence: {}", e)))?;

        Ok(exists)
    }

    async fn create(&self, record: ClientRecord) -> Result<ClientRecord, AuthError> {
        let created = sqlx::query_as::<_, ClientRecord>(
            r#"
            INSERT INTO oauth2_clients (
                record_id, client_id, client_secret, client_name, client_description,
                redirect_uris, scopes, grant_types, auth_methods,
                access_token_ttl_seconds, refresh_token_ttl_seconds,
                require_proof_key, require_consent, reuse_refresh_tokens
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING
                record_id, client_id, client_secret, client_name, client_description,
                redirect_uris, scopes, grant_types, auth_methods,
                access_token_ttl_seconds, refresh_token_ttl_seconds,
                require_proof_key, require_consent, reuse_refresh_tokens,
                created_at, updated_at
            "#,
        )
        .bind(record.record_id)
        .bind(&record.client_id)
        .bind(&record.client_secret)
        .bind(&record.client_name)
        .bind(&record.client_description)
        .bind(&record.redirect_uris)
        .bind(&record.scopes)
        .bind(&record.grant_types)
        .bind(&record.auth_methods)
        .bind(record.access_token_ttl_seconds)
        .bind(record.refresh_token_ttl_seconds)
        .bind(record.require_proof_key)
        .bind(record.require_consent)
        .bind(record.reuse_refresh_tokens)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Client id is already registered", "Failed to create client"))?;

        Ok(created)
    }

    async fn update(&self, record: &ClientRecord) -> Result<ClientRecord, AuthError> {
        let updated = sqlx::query_as::<_, ClientRecord>(
            r#"
            UPDATE oauth2_clients
            SET
                client_secret = $2,
                client_name = $3,
                client_description = $4,
                redirect_uris = $5,
                scopes = $6,
                grant_types = $7,
                auth_methods = $8,
                access_token_ttl_seconds = $9,
                refresh_token_ttl_seconds = $10,
                require_proof_key = $11,
                require_consent = $12,
                reuse_refresh_tokens = $13,
                updated_at = NOW()
            WHERE client_id = $1
            RETURNING
                record_id, client_id, client_secret, client_name, client_description,
                redirect_uris, scopes, grant_types, auth_methods,
                access_token_ttl_seconds, refresh_token_ttl_seconds,
                require_proof_key, require_consent, reuse_refresh_tokens,
                created_at, updated_at
            "#,
        )
        .bind(&record.client_id)
        .bind(&record.client_secret)
        .bind(&record.client_name)
        .bind(&record.client_description)
        .bind(&record.redirect_uris)
        .bind(&record.scopes)
        .bind(&record.grant_types)
        .bind(&record.auth_methods)
        .bind(record.access_token_ttl_seconds)
        .bind(record.refresh_token_ttl_seconds)
        .bind(record.require_proof_key)
        .bind(record.require_consent)
        .bind(record.reuse_refresh_tokens)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Database(format!("Failed to update client: {}", e)))?;

        updated.ok_or_else(|| AuthError::NotFound("Client not found".to_string()))
    }
}
