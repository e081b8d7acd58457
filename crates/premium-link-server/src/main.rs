//! Premium Link Server binary.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use premium_link_server::config::{Config, OracleSource, StorageSource};
use premium_link_server::oracle::{FixedOwnershipOracle, HttpOwnershipOracle, OwnershipOracle};
use premium_link_server::registry::{LinkRegistry, MemoryLinkRegistry, PgLinkRegistry};
use premium_link_server::{create_router, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "premium_link_server=info,tower_http=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    let oracle_timeout = config.oracle_timeout()?;

    let registry: Arc<dyn LinkRegistry> = match config.storage()? {
        StorageSource::Postgres {
            url,
            max_connections,
        } => {
            let pool = db::create_pool(&url, max_connections)
                .await
                .context("failed to connect to database")?;
            db::run_migrations(&pool)
                .await
                .context("failed to run migrations")?;
            tracing::info!(max_connections, "Connected to PostgreSQL");
            Arc::new(PgLinkRegistry::new(pool))
        }
        StorageSource::Memory => {
            tracing::warn!("Using in-memory binding registry, bindings are lost on restart");
            Arc::new(MemoryLinkRegistry::new())
        }
    };

    let oracle: Arc<dyn OwnershipOracle> = match config.oracle()? {
        OracleSource::Http { url, api_key } => {
            tracing::info!(oracle_url = %url, "Using HTTP ownership oracle");
            Arc::new(HttpOwnershipOracle::new(&url, api_key, oracle_timeout)?)
        }
        OracleSource::Fixture(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let oracle = FixedOwnershipOracle::from_json(&json)
                .with_context(|| format!("invalid ownership fixture {}", path.display()))?;
            tracing::warn!(fixture = %path.display(), "Using fixed ownership oracle");
            Arc::new(oracle)
        }
    };

    if config.admin_token.as_deref().map_or(true, str::is_empty) {
        tracing::info!("ADMIN_TOKEN not set, admin routes disabled");
    }

    let state = AppState::new(registry, oracle, oracle_timeout)
        .with_admin_token(config.admin_token.clone());

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "Premium link server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
