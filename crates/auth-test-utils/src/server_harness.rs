//! Test server harness for E2E testing
//!
//! Provides TestAuthServer for spawning real auth service instances in tests,
//! backed by in-memory repositories.

use crate::crypto_fixtures::{test_codec, test_jwt_secret};
use auth_service::config::{Config, MIN_BCRYPT_COST};
use auth_service::crypto::codec::Claims;
use auth_service::models::{ClientRecord, RegisterRequest, TokenPair};
use auth_service::observability::metrics::detached_handle;
use auth_service::repositories::memory::{InMemoryClientRepository, InMemoryUserRepository};
use auth_service::repositories::ClientRepository;
use auth_service::routes::{self, AppState};
use auth_service::services::{token_service::TokenService, user_service};
use common::secret::SecretString;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Test harness for spawning the auth service in E2E tests
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_login_e2e() -> anyhow::Result<()> {
///     let server = TestAuthServer::spawn().await?;
///     server.seed_user("john_doe", "john@example.com", "password123").await?;
///
///     let response = reqwest::Client::new()
///         .post(format!("{}/api/login", server.url()))
///         .json(&serde_json::json!({"username": "john_doe", "password": "password123"}))
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestAuthServer {
    addr: SocketAddr,
    config: Config,
    users: Arc<InMemoryUserRepository>,
    clients: Arc<InMemoryClientRepository>,
    _handle: JoinHandle<()>,
}

impl TestAuthServer {
    /// Spawn with the default 10 minute access / 1 day refresh lifetimes.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_ttls(Duration::from_secs(600), Duration::from_secs(86_400)).await
    }

    /// Spawn a new test server instance with the given token lifetimes.
    ///
    /// The server binds to a random available port (127.0.0.1:0) and runs in
    /// the background until dropped.
    pub async fn spawn_with_ttls(
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, anyhow::Error> {
        let config = Config {
            jwt_secret: test_jwt_secret(),
            access_ttl,
            refresh_ttl,
            database_url: None,
            bind_address: "127.0.0.1:0".to_string(),
            bcrypt_cost: MIN_BCRYPT_COST,
        };

        let users = Arc::new(InMemoryUserRepository::new());
        let clients = Arc::new(InMemoryClientRepository::new());

        let tokens = Arc::new(TokenService::new(
            test_codec(),
            access_ttl,
            refresh_ttl,
            users.clone(),
        ));

        let state = Arc::new(AppState {
            tokens,
            users: users.clone(),
            clients: clients.clone(),
            config: config.clone(),
        });

        // Recorder is not installed globally, so many servers can coexist in
        // one test process.
        let metrics_handle = detached_handle().map_err(|e| anyhow::anyhow!(e))?;

        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            users,
            clients,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Backing user store, for asserting on what the HTTP surface persisted.
    pub fn users(&self) -> &InMemoryUserRepository {
        &self.users
    }

    /// Register a user directly through the service layer.
    pub async fn seed_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), anyhow::Error> {
        user_service::register_user(
            self.users.as_ref(),
            RegisterRequest {
                username: username.to_string(),
                email: email.to_string(),
                password: SecretString::from(password.to_string()),
            },
            self.config.bcrypt_cost,
        )
        .await?;
        Ok(())
    }

    /// Store a client record as-is.
    pub async fn seed_client(&self, record: ClientRecord) -> Result<(), anyhow::Error> {
        self.clients.create(record).await?;
        Ok(())
    }

    /// Access token for `username` signed with the server's secret, valid
    /// for the configured access lifetime. The user need not exist.
    pub fn access_token_for(&self, username: &str) -> Result<String, anyhow::Error> {
        Ok(test_codec().encode(&Claims::new(username, None), self.config.access_ttl)?)
    }

    /// Log in over HTTP and return the issued pair.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, anyhow::Error> {
        let response = reqwest::Client::new()
            .post(format!("{}/api/login", self.url()))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<TokenPair>().await?)
    }
}

impl Drop for TestAuthServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
