use chrono::{DateTime, Utc};
use common::secret::SecretString;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Auth method assumed when a client record lists none.
pub const DEFAULT_AUTH_METHOD: &str = "client_secret_basic";

pub const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i32 = 3600;
pub const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: i32 = 86_400;

/// User account (maps to users table)
#[derive(Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Fields for a new user; `password_hash` is already bcrypt-hashed.
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Registered OAuth client (maps to oauth2_clients table)
///
/// List-valued columns are stored delimited: redirect URIs, grant types and
/// auth methods by commas, scopes by spaces.
#[derive(Clone, FromRow)]
pub struct ClientRecord {
    pub record_id: Uuid,
    pub client_id: String,
    /// bcrypt hash (bare or `{bcrypt}`-prefixed) or plain text (bare or `{noop}`-prefixed)
    pub client_secret: String,
    pub client_name: Option<String>,
    pub client_description: Option<String>,
    pub redirect_uris: Option<String>,
    pub scopes: Option<String>,
    pub grant_types: Option<String>,
    pub auth_methods: Option<String>,
    pub access_token_ttl_seconds: i32,
    pub refresh_token_ttl_seconds: i32,
    pub require_proof_key: bool,
    pub require_consent: bool,
    pub reuse_refresh_tokens: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClientRecord {
    /// A record with every policy field at its default.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            record_id: Uuid::new_v4(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            client_name: None,
            client_description: None,
            redirect_uris: None,
            scopes: None,
            grant_types: None,
            auth_methods: Some(DEFAULT_AUTH_METHOD.to_string()),
            access_token_ttl_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            refresh_token_ttl_seconds: DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
            require_proof_key: false,
            require_consent: true,
            reuse_refresh_tokens: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl fmt::Debug for ClientRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRecord")
            .field("record_id", &self.record_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("client_name", &self.client_name)
            .field("redirect_uris", &self.redirect_uris)
            .field("scopes", &self.scopes)
            .field("grant_types", &self.grant_types)
            .field("auth_methods", &self.auth_methods)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("refresh_token_ttl_seconds", &self.refresh_token_ttl_seconds)
            .field("require_proof_key", &self.require_proof_key)
            .field("require_consent", &self.require_consent)
            .field("reuse_refresh_tokens", &self.reuse_refresh_tokens)
            .finish_non_exhaustive()
    }
}

/// Policy changes applied through the client update path. `None` keeps the
/// stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientUpdate {
    pub client_name: Option<String>,
    pub client_description: Option<String>,
    pub redirect_uris: Option<Vec<String>>,
    pub scopes: Option<Vec<String>>,
    pub grant_types: Option<Vec<String>>,
    pub auth_methods: Option<Vec<String>>,
    pub access_token_ttl_seconds: Option<i32>,
    pub refresh_token_ttl_seconds: Option<i32>,
    pub require_proof_key: Option<bool>,
    pub require_consent: Option<bool>,
    pub reuse_refresh_tokens: Option<bool>,
}

/// Access/refresh token pair. Replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Grant types a client may use.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "String")]
pub enum GrantType {
    AuthorizationCode,
    RefreshToken,
    ClientCredentials,
    DeviceCode,
    Other(String),
}

impl GrantType {
    pub fn as_str(&self) -> &str {
        match self {
            GrantType::AuthorizationCode => "authorization_code",
            GrantType::RefreshToken => "refresh_token",
            GrantType::ClientCredentials => "client_credentials",
            GrantType::DeviceCode => "urn:ietf:params:oauth:grant-type:device_code",
            GrantType::Other(value) => value,
        }
    }
}

impl From<&str> for GrantType {
    fn from(value: &str) -> Self {
        match value {
            "authorization_code" => GrantType::AuthorizationCode,
            "refresh_token" => GrantType::RefreshToken,
            "client_credentials" => GrantType::ClientCredentials,
            "urn:ietf:params:oauth:grant-type:device_code" => GrantType::DeviceCode,
            other => GrantType::Other(other.to_string()),
        }
    }
}

impl From<GrantType> for String {
    fn from(value: GrantType) -> Self {
        value.as_str().to_string()
    }
}

/// Ways a client may authenticate to the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "String")]
pub enum ClientAuthMethod {
    ClientSecretBasic,
    ClientSecretPost,
    ClientSecretJwt,
    PrivateKeyJwt,
    None,
    Other(String),
}

impl ClientAuthMethod {
    pub fn as_str(&self) -> &str {
        match self {
            ClientAuthMethod::ClientSecretBasic => "client_secret_basic",
            ClientAuthMethod::ClientSecretPost => "client_secret_post",
            ClientAuthMethod::ClientSecretJwt => "client_secret_jwt",
            ClientAuthMethod::PrivateKeyJwt => "private_key_jwt",
            ClientAuthMethod::None => "none",
            ClientAuthMethod::Other(value) => value,
        }
    }
}

impl From<&str> for ClientAuthMethod {
    fn from(value: &str) -> Self {
        match value {
            "client_secret_basic" => ClientAuthMethod::ClientSecretBasic,
            "client_secret_post" => ClientAuthMethod::ClientSecretPost,
            "client_secret_jwt" => ClientAuthMethod::ClientSecretJwt,
            "private_key_jwt" => ClientAuthMethod::PrivateKeyJwt,
            "none" => ClientAuthMethod::None,
            other => ClientAuthMethod::Other(other.to_string()),
        }
    }
}

impl From<ClientAuthMethod> for String {
    fn from(value: ClientAuthMethod) -> Self {
        value.as_str().to_string()
    }
}

/// Typed projection of a [`ClientRecord`], rebuilt on every validation.
/// Never carries the client secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientDescriptor {
    pub record_id: Uuid,
    pub client_id: String,
    pub client_name: Option<String>,
    pub redirect_uris: BTreeSet<String>,
    pub scopes: BTreeSet<String>,
    pub grant_types: BTreeSet<GrantType>,
    pub auth_methods: BTreeSet<ClientAuthMethod>,
    /// Whole minutes
    pub access_token_ttl_minutes: i64,
    /// Whole minutes
    pub refresh_token_ttl_minutes: i64,
    pub require_proof_key: bool,
    pub require_consent: bool,
    pub reuse_refresh_tokens: bool,
}

impl ClientDescriptor {
    pub fn access_token_ttl(&self) -> Duration {
        minutes_to_duration(self.access_token_ttl_minutes)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        minutes_to_duration(self.refresh_token_ttl_minutes)
    }
}

fn minutes_to_duration(minutes: i64) -> Duration {
    Duration::from_secs(u64::try_from(minutes).unwrap_or(0).saturating_mul(60))
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: SecretString,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: SecretString,
}

/// Request body for a profile update. An absent or empty password keeps the
/// current one.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<SecretString>,
}

/// Public view of a user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// Request body for client registration. A missing secret is generated and
/// returned once in the response.
#[derive(Debug, Deserialize)]
pub struct RegisterClientRequest {
    pub client_id: String,
    pub client_secret: Option<SecretString>,
    pub client_name: Option<String>,
    pub client_description: Option<String>,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub grant_types: Vec<String>,
    #[serde(default)]
    pub auth_methods: Vec<String>,
    pub access_token_ttl_seconds: Option<i32>,
    pub refresh_token_ttl_seconds: Option<i32>,
    pub require_proof_key: Option<bool>,
    pub require_consent: Option<bool>,
    pub reuse_refresh_tokens: Option<bool>,
}

/// Client registration response. `client_secret` is present only when the
/// service generated it.
#[derive(Debug, Serialize)]
pub struct RegisterClientResponse {
    #[serde(flatten)]
    pub client: ClientDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}
