use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use notebook_api::app::{app, AppState};
use notebook_api::auth::JwtIdentity;
use notebook_api::config::{self, StorageBackend};
use notebook_api::database::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config();
    tracing::info!("Starting notebook API in {:?} mode", config.environment);

    let store: Arc<dyn Store> = match config.server.storage {
        StorageBackend::Postgres => {
            let store = PgStore::connect(&config.database)
                .await
                .context("failed to connect to database")?;
            Arc::new(store)
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory store; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    if config.security.jwt_secret.is_empty() {
        tracing::error!("JWT_SECRET is empty; every protected request will be rejected");
    }
    let identity = Arc::new(JwtIdentity::from_config());

    let app = app(AppState::new(store, identity));

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("notebook API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
