//! # Comanda API server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Comanda API Server                             │
//! │                                                                         │
//! │  Dashboard ───► HTTP (3000) ───► Services ───► SQLite                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use comanda_api::{build_router, AppConfig, AppState};
use comanda_db::{Database, DbConfig};

const IN_MEMORY: &str = ":memory:";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting Comanda API server...");
    info!(
        addr = %config.socket_addr()?,
        database = %config.database_path,
        "Configuration loaded"
    );
    if config.jwt_secret == AppConfig::default().jwt_secret {
        warn!("Using the built-in development JWT secret; set COMANDA_JWT_SECRET");
    }

    let db_config = if config.database_path == IN_MEMORY {
        DbConfig::in_memory()
    } else {
        DbConfig::new(&config.database_path).max_connections(config.database_max_connections)
    };
    let db = Database::new(db_config)
        .await
        .context("Failed to open database")?;
    info!("Database ready");

    let addr = config.socket_addr()?;
    let state = Arc::new(AppState::new(config, db.clone()));
    let app = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
