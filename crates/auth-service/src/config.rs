use common::jwt::MIN_HMAC_KEY_BYTES;
use common::secret::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default access token lifetime: 10 minutes.
pub const DEFAULT_ACCESS_TTL_MS: u64 = 600_000;

/// Default refresh token lifetime: 24 hours.
pub const DEFAULT_REFRESH_TTL_MS: u64 = 86_400_000;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default bcrypt cost factor for passwords and client secrets.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Below 10 is too cheap to brute-force resist; above 14 makes login unusably slow.
pub const MIN_BCRYPT_COST: u32 = 10;
pub const MAX_BCRYPT_COST: u32 = 14;

#[derive(Clone)]
pub struct Config {
    /// Shared HMAC secret for HS256 token signing.
    pub jwt_secret: SecretString,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// `None` selects the in-memory repositories.
    pub database_url: Option<String>,
    pub bind_address: String,
    pub bcrypt_cost: u32,
}

// Manual Debug keeps the database URL (which may embed credentials) out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("jwt_secret", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("bind_address", &self.bind_address)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid JWT secret: {0}")]
    InvalidJwtSecret(String),

    #[error("Invalid token lifetime for {name}: {reason}")]
    InvalidTokenLifetime { name: String, reason: String },

    #[error("Invalid bcrypt cost: {0}")]
    InvalidBcryptCost(String),
}

impl Config {
    /// Access token lifetime in whole milliseconds, saturating at `u64::MAX`.
    pub fn access_ttl_ms(&self) -> u64 {
        saturating_millis(self.access_ttl)
    }

    /// Refresh token lifetime in whole milliseconds, saturating at `u64::MAX`.
    pub fn refresh_ttl_ms(&self) -> u64 {
        saturating_millis(self.refresh_ttl)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let jwt_secret = SecretString::from(
            vars.get("JWT_SECRET")
                .ok_or_else(|| ConfigError::MissingEnvVar("JWT_SECRET".to_string()))?
                .clone(),
        );

        let secret_len = jwt_secret.expose_secret().len();
        if secret_len < MIN_HMAC_KEY_BYTES {
            return Err(ConfigError::InvalidJwtSecret(format!(
                "Expected at least {MIN_HMAC_KEY_BYTES} bytes, got {secret_len}"
            )));
        }

        let access_ttl = parse_ttl_ms(vars, "JWT_EXPIRATION_MS", DEFAULT_ACCESS_TTL_MS)?;
        let refresh_ttl =
            parse_ttl_ms(vars, "JWT_REFRESH_EXPIRATION_MS", DEFAULT_REFRESH_TTL_MS)?;

        let database_url = vars
            .get("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .cloned();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let bcrypt_cost = match vars.get("BCRYPT_COST") {
            Some(raw) => {
                let cost: u32 = raw.parse().map_err(|e| {
                    ConfigError::InvalidBcryptCost(format!("'{raw}' is not a valid integer: {e}"))
                })?;
                if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
                    return Err(ConfigError::InvalidBcryptCost(format!(
                        "{cost} is outside the allowed range {MIN_BCRYPT_COST}-{MAX_BCRYPT_COST}"
                    )));
                }
                cost
            }
            None => DEFAULT_BCRYPT_COST,
        };

        Ok(Config {
            jwt_secret,
            access_ttl,
            refresh_ttl,
            database_url,
            bind_address,
            bcrypt_cost,
        })
    }
}

fn parse_ttl_ms(
    vars: &HashMap<String, String>,
    name: &str,
    default_ms: u64,
) -> Result<Duration, ConfigError> {
    let Some(raw) = vars.get(name) else {
        return Ok(Duration::from_millis(default_ms));
    };

    let ms: u64 = raw
        .parse()
        .map_err(|e| ConfigError::InvalidTokenLifetime {
            name: name.to_string(),
            reason: format!("'{raw}' is not a valid integer: {e}"),
        })?;

    if ms == 0 {
        return Err(ConfigError::InvalidTokenLifetime {
            name: name.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(Duration::from_millis(ms))
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
