//! Medcover HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # In-memory with demo courses
//! SEED_DEMO_DATA=true cargo run --bin medcover-server
//!
//! # PostgreSQL
//! STORAGE_BACKEND=postgres DATABASE_URL=postgres://... cargo run --bin medcover-server
//! ```

use anyhow::Context;
use medcover::{Config, app, build_router};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,medcover=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting medcover server...");

    let config = Config::from_env();
    tracing::info!(
        bind = %config.server.bind_addr(),
        storage = ?config.storage,
        transitions = ?config.transitions,
        "Configuration loaded"
    );

    let state = app::build_state(&config).await?;
    let router = build_router(state);

    let listener = TcpListener::bind(config.server.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr()))?;
    tracing::info!(addr = %config.server.bind_addr(), "✓ Listening");

    let shutdown_timeout = config.server.shutdown_timeout();
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
        .await
        .context("server error")?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM. In-flight requests then get
/// `timeout` to finish before the process exits regardless.
async fn shutdown_signal(timeout: std::time::Duration) {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(error) => {
                tracing::error!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!(?timeout, "Shutting down gracefully...");
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        tracing::warn!("Graceful shutdown timed out, exiting");
        std::process::exit(1);
    });
}
