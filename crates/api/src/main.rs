use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use timeasy_core::clock::{Clock, SystemClock};
use timeasy_db::{MemoryStore, PgStore};
use timeasy_usecase::Services;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use timeasy_api::auth::KeycloakVerifier;
use timeasy_api::config::{Cli, LogFormat, ServerConfig, Storage};
use timeasy_api::router::build_app_router;
use timeasy_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let cli = Cli::parse();
    let config = ServerConfig::load(&cli).context("Invalid configuration")?;

    // --- Tracing ---
    let (json, pretty) = match config.log_format {
        LogFormat::Json => (Some(tracing_subscriber::fmt::layer().json()), None),
        LogFormat::Pretty => (None, Some(tracing_subscriber::fmt::layer())),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "timeasy_api=debug,timeasy_usecase=info,tower_http=debug".into()
            }),
        )
        .with(json)
        .with(pretty)
        .init();

    tracing::info!(
        host = %config.host,
        port = %config.port,
        storage = ?config.storage,
        realm = %config.keycloak.realm,
        "Loaded server configuration"
    );

    // --- Storage ---
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let (services, pool) = match config.storage {
        Storage::Postgres => {
            let pool = timeasy_db::create_pool(&config.database.url())
                .await
                .context("Failed to connect to database")?;
            tracing::info!(
                host = %config.database.host,
                database = %config.database.name,
                "Database connection pool created"
            );

            timeasy_db::health_check(&pool)
                .await
                .context("Database health check failed")?;
            tracing::info!("Database health check passed");

            timeasy_db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");

            let store = Arc::new(PgStore::new(pool.clone(), clock.clone()));
            (Services::new(store, clock), Some(pool))
        }
        Storage::Memory => {
            tracing::warn!("Using in-process storage; all data is lost on shutdown");
            let store = Arc::new(MemoryStore::new(clock.clone()));
            (Services::new(store, clock), None)
        }
    };

    // --- Token verification ---
    let verifier = Arc::new(KeycloakVerifier::new(&config.keycloak));
    tracing::info!(issuer = %config.keycloak.issuer(), "Keycloak token verifier configured");

    // --- Router ---
    let bind_address = config.bind_address();
    let state = AppState {
        services,
        verifier,
        config: Arc::new(config),
        pool,
    };
    let app = build_app_router(state).context("Invalid CORS origin")?;

    // --- Serve ---
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind to {bind_address}"))?;
    tracing::info!(address = %bind_address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
