use auth_service::config::Config;
use auth_service::crypto::codec::TokenCodec;
use auth_service::observability::metrics::init_metrics_recorder;
use auth_service::repositories::clients::PgClientRepository;
use auth_service::repositories::memory::{InMemoryClientRepository, InMemoryUserRepository};
use auth_service::repositories::users::PgUserRepository;
use auth_service::repositories::{ClientRepository, UserRepository};
use auth_service::routes::{self, AppState};
use auth_service::services::token_service::TokenService;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Repositories = (Arc<dyn UserRepository>, Arc<dyn ClientRepository>);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Auth Service");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        access_ttl_ms = config.access_ttl_ms(),
        refresh_ttl_ms = config.refresh_ttl_ms(),
        "Configuration loaded successfully"
    );

    // Install the recorder before anything records a metric
    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;

    let (users, clients) = connect_repositories(config.database_url.as_deref()).await?;

    let codec = TokenCodec::from_secret(&config.jwt_secret).map_err(|e| {
        error!("Failed to derive signing key: {}", e);
        e
    })?;
    let tokens = Arc::new(TokenService::new(
        codec,
        config.access_ttl,
        config.refresh_ttl,
        users.clone(),
    ));

    // Parse bind address before moving config
    let bind_address = config.bind_address.clone();

    let state = Arc::new(AppState {
        tokens,
        users,
        clients,
        config,
    });

    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Auth Service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// PostgreSQL-backed repositories when a database URL is configured,
/// otherwise process-local in-memory ones.
async fn connect_repositories(
    database_url: Option<&str>,
) -> Result<Repositories, Box<dyn std::error::Error>> {
    let Some(database_url) = database_url else {
        warn!("DATABASE_URL not set, using in-memory repositories; data is lost on restart");
        return Ok((
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryClientRepository::new()),
        ));
    };

    info!("Connecting to database...");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            e
        })?;

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            error!("Failed to run migrations: {}", e);
            e
        })?;

    info!("Database connection established");

    Ok((
        Arc::new(PgUserRepository::new(pool.clone())),
        Arc::new(PgClientRepository::new(pool)),
    ))
}
