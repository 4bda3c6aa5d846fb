//! OAuth client validation, registration and descriptor construction.
//!
//! Stored client records keep their list fields as delimited strings. The
//! parsing helpers here are total: anything unparseable becomes an empty set,
//! items are trimmed, and empty items are dropped.

use crate::crypto;
use crate::errors::AuthError;
use crate::models::{
    ClientAuthMethod, ClientDescriptor, ClientRecord, ClientUpdate, GrantType,
    RegisterClientRequest, RegisterClientResponse, DEFAULT_AUTH_METHOD,
};
use crate::observability::hash_for_correlation;
use crate::observability::metrics::record_client_validation;
use crate::repositories::ClientRepository;
use common::secret::{ExposeSecret, SecretString};
use std::collections::BTreeSet;
use tracing::instrument;

/// Separator for redirect URIs, grant types and auth methods.
const LIST_SEPARATOR: char = ',';

/// Separator for scopes.
const SCOPE_SEPARATOR: char = ' ';

/// Check a client id/secret pair and build its descriptor.
///
/// # Errors
///
/// - `InvalidInput` if either value is empty (storage is not consulted)
/// - `ClientNotFound` if no record has this client id
/// - `ClientAuthentication` if the secret does not match
#[instrument(skip_all)]
pub async fn validate_client(
    repo: &dyn ClientRepository,
    client_id: &str,
    client_secret: &str,
) -> Result<ClientDescriptor, AuthError> {
    if client_id.trim().is_empty() || client_secret.is_empty() {
        record_client_validation("invalid_input");
        return Err(AuthError::InvalidInput(
            "client_id and client_secret are required".to_string(),
        ));
    }

    let client_hash = hash_for_correlation(client_id);
    let record = repo.find_by_client_id(client_id).await?;

    let Some(record) = record else {
        // Keep the miss as slow as a bcrypt mismatch.
        let _ = crypto::verify_hash(client_secret, crypto::DUMMY_BCRYPT_HASH);
        record_client_validation("not_found");
        tracing::debug!(target: "auth.services.client", client = %client_hash, "Unknown client");
        return Err(AuthError::ClientNotFound);
    };

    if !crypto::verify_client_secret(client_secret, &record.client_secret)? {
        record_client_validation("invalid_secret");
        tracing::warn!(target: "auth.services.client", client = %client_hash, "Client secret mismatch");
        return Err(AuthError::ClientAuthentication);
    }

    record_client_validation("success");
    tracing::debug!(target: "auth.services.client", client = %client_hash, "Client validated");
    Ok(to_descriptor(&record))
}

/// Register a new client.
///
/// The secret is bcrypt-hashed before storage. When the request omits it, one
/// is generated and returned in the response; it is not retrievable later.
#[instrument(skip_all)]
pub async fn register_client(
    repo: &dyn ClientRepository,
    request: RegisterClientRequest,
    bcrypt_cost: u32,
) -> Result<RegisterClientResponse, AuthError> {
    let client_id = request.client_id.trim().to_string();
    if client_id.is_empty() {
        return Err(AuthError::InvalidInput("client_id is required".to_string()));
    }

    if repo.exists_by_client_id(&client_id).await? {
        return Err(AuthError::Conflict(format!(
            "Client '{}' is already registered",
            client_id
        )));
    }

    let (secret, generated) = match request.client_secret {
        Some(secret) if !secret.expose_secret().is_empty() => (secret, false),
        _ => (crypto::generate_client_secret()?, true),
    };
    let secret_hash = crypto::hash_secret(secret.expose_secret(), bcrypt_cost)?;

    let mut record = ClientRecord::new(client_id, secret_hash);
    record.client_name = request.client_name;
    record.client_description = request.client_description;
    record.redirect_uris = join_list(&request.redirect_uris, LIST_SEPARATOR);
    record.scopes = join_list(&request.scopes, SCOPE_SEPARATOR);
    record.grant_types = join_list(&request.grant_types, LIST_SEPARATOR);
    if let Some(methods) = join_list(&request.auth_methods, LIST_SEPARATOR) {
        record.auth_methods = Some(methods);
    }
    if let Some(ttl) = request.access_token_ttl_seconds {
        record.access_token_ttl_seconds = positive_ttl(ttl, "access_token_ttl_seconds")?;
    }
    if let Some(ttl) = request.refresh_token_ttl_seconds {
        record.refresh_token_ttl_seconds = positive_ttl(ttl, "refresh_token_ttl_seconds")?;
    }
    if let Some(flag) = request.require_proof_key {
        record.require_proof_key = flag;
    }
    if let Some(flag) = request.require_consent {
        record.require_consent = flag;
    }
    if let Some(flag) = request.reuse_refresh_tokens {
        record.reuse_refresh_tokens = flag;
    }

    let created = repo.create(record).await?;
    tracing::info!(
        target: "auth.services.client",
        client = %hash_for_correlation(&created.client_id),
        generated_secret = generated,
        "Client registered"
    );

    Ok(RegisterClientResponse {
        client: to_descriptor(&created),
        client_secret: generated.then(|| reveal(secret)),
    })
}

fn reveal(secret: SecretString) -> String {
    secret.expose_secret().to_string()
}

/// Apply a policy update to an existing client. The stored secret is untouched.
#[instrument(skip_all)]
pub async fn update_client(
    repo: &dyn ClientRepository,
    client_id: &str,
    update: ClientUpdate,
) -> Result<ClientDescriptor, AuthError> {
    let mut record = repo
        .find_by_client_id(client_id)
        .await?
        .ok_or_else(|| AuthError::NotFound("Client not found".to_string()))?;

    if let Some(name) = update.client_name {
        record.client_name = Some(name);
    }
    if let Some(description) = update.client_description {
        record.client_description = Some(description);
    }
    if let Some(uris) = update.redirect_uris {
        record.redirect_uris = join_list(&uris, LIST_SEPARATOR);
    }
    if let Some(scopes) = update.scopes {
        record.scopes = join_list(&scopes, SCOPE_SEPARATOR);
    }
    if let Some(grants) = update.grant_types {
        record.grant_types = join_list(&grants, LIST_SEPARATOR);
    }
    if let Some(methods) = update.auth_methods {
        record.auth_methods = join_list(&methods, LIST_SEPARATOR);
    }
    if let Some(ttl) = update.access_token_ttl_seconds {
        record.access_token_ttl_seconds = positive_ttl(ttl, "access_token_ttl_seconds")?;
    }
    if let Some(ttl) = update.refresh_token_ttl_seconds {
        record.refresh_token_ttl_seconds = positive_ttl(ttl, "refresh_token_ttl_seconds")?;
    }
    if let Some(flag) = update.require_proof_key {
        record.require_proof_key = flag;
    }
    if let Some(flag) = update.require_consent {
        record.require_consent = flag;
    }
    if let Some(flag) = update.reuse_refresh_tokens {
        record.reuse_refresh_tokens = flag;
    }

    let updated = repo.update(&record).await?;
    tracing::info!(
        target: "auth.services.client",
        client = %hash_for_correlation(&updated.client_id),
        "Client updated"
    );

    Ok(to_descriptor(&updated))
}

fn positive_ttl(seconds: i32, field: &str) -> Result<i32, AuthError> {
    if seconds <= 0 {
        return Err(AuthError::InvalidInput(format!(
            "{} must be greater than zero",
            field
        )));
    }
    Ok(seconds)
}

/// Join trimmed, non-empty items. `None` when nothing remains.
fn join_list(items: &[String], separator: char) -> Option<String> {
    let kept: Vec<&str> = items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .collect();

    if kept.is_empty() {
        None
    } else {
        Some(kept.join(separator.to_string().as_str()))
    }
}

fn split_list(value: Option<&str>, separator: char) -> impl Iterator<Item = &str> {
    value
        .unwrap_or_default()
        .split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

/// Comma-delimited redirect URIs.
pub fn parse_redirect_uris(value: Option<&str>) -> BTreeSet<String> {
    split_list(value, LIST_SEPARATOR)
        .map(ToString::to_string)
        .collect()
}

/// Space-delimited scopes.
pub fn parse_scopes(value: Option<&str>) -> BTreeSet<String> {
    split_list(value, SCOPE_SEPARATOR)
        .map(ToString::to_string)
        .collect()
}

/// Comma-delimited grant types. Unknown names are kept as `GrantType::Other`.
pub fn parse_grant_types(value: Option<&str>) -> BTreeSet<GrantType> {
    split_list(value, LIST_SEPARATOR).map(GrantType::from).collect()
}

/// Comma-delimited auth methods, defaulting to `client_secret_basic` when
/// none are listed.
pub fn parse_auth_methods(value: Option<&str>) -> BTreeSet<ClientAuthMethod> {
    let methods: BTreeSet<ClientAuthMethod> = split_list(value, LIST_SEPARATOR)
        .map(ClientAuthMethod::from)
        .collect();

    if methods.is_empty() {
        BTreeSet::from([ClientAuthMethod::from(DEFAULT_AUTH_METHOD)])
    } else {
        methods
    }
}

/// Whole minutes, rounded down. Negative input counts as zero.
pub fn ttl_seconds_to_minutes(seconds: i32) -> i64 {
    i64::from(seconds.max(0)) / 60
}

/// Project a stored record into its typed descriptor. The secret is not carried.
pub fn to_descriptor(record: &ClientRecord) -> ClientDescriptor {
    ClientDescriptor {
        record_id: record.record_id,
        client_id: record.client_id.clone(),
        client_name: record.client_name.clone(),
        redirect_uris: parse_redirect_uris(record.redirect_uris.as_deref()),
        scopes: parse_scopes(record.scopes.as_deref()),
        grant_types: parse_grant_types(record.grant_types.as_deref()),
        auth_methods: parse_auth_methods(record.auth_methods.as_deref()),
        access_token_ttl_minutes: ttl_seconds_to_minutes(record.access_token_ttl_seconds),
        refresh_token_ttl_minutes: ttl_seconds_to_minutes(record.refresh_token_ttl_seconds),
        require_proof_key: record.require_proof_key,
        require_consent: record.require_consent,
        reuse_refresh_tokens: record.reuse_refresh_tokens,
    }
}
