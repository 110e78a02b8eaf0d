//! Process start-up: adapter selection, migrations and worker wiring.

mod config;
mod state_builders;

pub use config::BookingSettings;
pub use state_builders::BookingService;

use color_eyre::eyre::{Context, Result};
use tracing::info;

use booking::outbound::persistence::{DbPool, run_migrations};
use state_builders::{StoreBackend, build_cache, build_service};

/// Bring the booking core up from `settings`.
///
/// With a database configured the schema is migrated before the pool is
/// handed to the Diesel adapters; otherwise every port is served by one
/// in-process store.
pub async fn start(settings: &BookingSettings) -> Result<BookingService> {
    let use_cases = settings
        .use_case_settings()
        .wrap_err("invalid BOOKING_DEFAULT_PAGE_SIZE")?;

    let backend = match settings.pool_config() {
        Some(pool_config) => {
            run_migrations(pool_config.database_url())
                .await
                .wrap_err("failed to apply database migrations")?;
            let pool = DbPool::new(pool_config)
                .await
                .wrap_err("failed to create database pool")?;
            StoreBackend::Postgres(pool)
        }
        None => {
            info!("no database configured; using in-memory store");
            StoreBackend::InMemory
        }
    };

    let cache = build_cache(settings.redis_url.as_deref(), settings.db_pool_size).await;
    Ok(build_service(
        backend,
        cache,
        settings.cache_worker_config(),
        use_cases,
    ))
}
