//! Builders pairing repository adapters with the use case registry.

use std::sync::Arc;

use mockable::DefaultClock;
use tracing::{info, warn};

use booking::domain::ports::{
    AppointmentRepository, BookingCache, NoopBookingCache, StatsRepository, TrainRepository,
};
use booking::domain::usecases::{BookingPorts, UseCaseRegistry, UseCaseSettings};
use booking::domain::{CacheWorkerConfig, RunningCacheWorker, spawn_cache_worker};
use booking::outbound::cache::RedisBookingCache;
use booking::outbound::identity::UuidV7Generator;
use booking::outbound::memory::InMemoryBookingStore;
use booking::outbound::persistence::{
    DbPool, DieselAppointmentRepository, DieselStatsRepository, DieselTrainRepository,
};

/// Registry plus the background worker it hands invalidation jobs to.
pub struct BookingService {
    pub registry: UseCaseRegistry,
    pub cache_worker: RunningCacheWorker,
}

/// Repository adapters chosen at start-up.
pub(super) enum StoreBackend {
    Postgres(DbPool),
    InMemory,
}

/// Connect Redis when configured, otherwise fall back to a no-op cache.
///
/// A Redis outage at start-up only costs cache freshness, so it degrades to
/// the no-op adapter instead of failing the process.
pub(super) async fn build_cache(redis_url: Option<&str>, max_size: u32) -> Arc<dyn BookingCache> {
    let Some(url) = redis_url else {
        info!("no redis configured; cache invalidation disabled");
        return Arc::new(NoopBookingCache);
    };
    match RedisBookingCache::connect(url, max_size).await {
        Ok(cache) => Arc::new(cache),
        Err(err) => {
            warn!(error = %err, "redis unavailable; cache invalidation disabled");
            Arc::new(NoopBookingCache)
        }
    }
}

fn wire<T, A, S>(
    trains: Arc<T>,
    appointments: Arc<A>,
    stats: Arc<S>,
    cache: Arc<dyn BookingCache>,
    worker_config: CacheWorkerConfig,
    settings: UseCaseSettings,
) -> BookingService
where
    T: TrainRepository + 'static,
    A: AppointmentRepository + 'static,
    S: StatsRepository + 'static,
{
    let cache_worker = spawn_cache_worker(Arc::clone(&trains), cache, worker_config);
    let registry = UseCaseRegistry::new(
        BookingPorts {
            trains,
            appointments,
            stats,
            ids: Arc::new(UuidV7Generator),
            cache: Arc::new(cache_worker.handle()),
            clock: Arc::new(DefaultClock),
        },
        settings,
    );
    BookingService {
        registry,
        cache_worker,
    }
}

/// Build the registry over the chosen store and start the cache worker.
pub(super) fn build_service(
    backend: StoreBackend,
    cache: Arc<dyn BookingCache>,
    worker_config: CacheWorkerConfig,
    settings: UseCaseSettings,
) -> BookingService {
    match backend {
        StoreBackend::Postgres(pool) => wire(
            Arc::new(DieselTrainRepository::new(pool.clone())),
            Arc::new(DieselAppointmentRepository::new(pool.clone())),
            Arc::new(DieselStatsRepository::new(pool)),
            cache,
            worker_config,
            settings,
        ),
        StoreBackend::InMemory => {
            let store = Arc::new(InMemoryBookingStore::new());
            wire(
                Arc::clone(&store),
                Arc::clone(&store),
                store,
                cache,
                worker_config,
                settings,
            )
        }
    }
}
