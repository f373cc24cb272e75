//! Wiring: picks the storage backend and assembles the [`AppState`].

use crate::config::{Config, StorageBackend};
use crate::server::AppState;
use crate::status::StatusLifecycle;
use crate::store::{CourseCatalog, InMemoryStore, PgStore, SubmissionStore, seed};
use anyhow::Context;
use medcover_core::environment::{Clock, SystemClock};
use std::sync::Arc;

/// Build the application state for `config`.
///
/// For `postgres` this connects, runs the embedded migrations and, when
/// `seed_demo_data` is set, seeds an empty catalog.
///
/// # Errors
///
/// Fails if the database cannot be reached or migrated.
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    build_state_with_clock(config, Arc::new(SystemClock)).await
}

/// [`build_state`] with an explicit clock.
///
/// # Errors
///
/// As [`build_state`].
pub async fn build_state_with_clock(
    config: &Config,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<AppState> {
    let (catalog, submissions): (Arc<dyn CourseCatalog>, Arc<dyn SubmissionStore>) =
        match config.storage {
            StorageBackend::Memory => {
                let store = InMemoryStore::with_clock(Arc::clone(&clock));
                if config.seed_demo_data {
                    let (courses, sessions) = seed::demo_catalog(clock.today());
                    store
                        .load_catalog(courses, sessions)
                        .context("failed to seed in-memory catalog")?;
                    tracing::info!("Seeded demo catalog");
                }
                tracing::warn!("Using in-memory storage; submissions are lost on restart");
                (Arc::new(store.clone()), Arc::new(store))
            },
            StorageBackend::Postgres => {
                let store = PgStore::connect(&config.postgres)
                    .await
                    .context("failed to connect to PostgreSQL")?;
                store.migrate().await.context("failed to run migrations")?;
                tracing::info!("✓ Migrations applied");
                if config.seed_demo_data {
                    let (courses, sessions) = seed::demo_catalog(clock.today());
                    if store
                        .seed_catalog(courses, sessions)
                        .await
                        .context("failed to seed catalog")?
                    {
                        tracing::info!("Seeded demo catalog");
                    }
                }
                (Arc::new(store.clone()), Arc::new(store))
            },
        };

    let lifecycle = StatusLifecycle::new(Arc::clone(&submissions), config.transitions);
    Ok(AppState::new(catalog, submissions, lifecycle, clock))
}
