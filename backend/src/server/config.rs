//! Process configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use pagination::{PageSize, PageSizeError};
use serde::Deserialize;

use booking::domain::usecases::UseCaseSettings;
use booking::domain::{CacheWorkerConfig, CompensationPolicy};
use booking::outbound::persistence::PoolConfig;

/// Settings controlling adapters, the cache worker and use case tunables.
///
/// Every field can be set through a `BOOKING_*` environment variable.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BOOKING")]
pub struct BookingSettings {
    /// PostgreSQL URL. The in-process store is used when absent.
    pub database_url: Option<String>,
    /// Redis URL. Cache invalidation becomes a no-op when absent.
    pub redis_url: Option<String>,
    /// Upper bound on pooled database and Redis connections.
    #[ortho_config(default = 8)]
    pub db_pool_size: u32,
    /// Pending invalidation jobs held before new ones are dropped.
    #[ortho_config(default = 1000)]
    pub cache_queue_capacity: usize,
    #[ortho_config(default = 5)]
    pub cache_workers: usize,
    /// Deadline for one invalidation job, in milliseconds.
    #[ortho_config(default = 10000)]
    pub cache_job_timeout_ms: u64,
    /// Deadline for one compensating capacity call, in milliseconds.
    #[ortho_config(default = 5000)]
    pub compensation_timeout_ms: u64,
    #[ortho_config(default = 20)]
    pub default_page_size: u32,
}

impl BookingSettings {
    /// Pool settings for the configured database, if any.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        self.database_url
            .as_deref()
            .map(|url| PoolConfig::new(url).with_max_size(self.db_pool_size))
    }

    pub fn cache_worker_config(&self) -> CacheWorkerConfig {
        CacheWorkerConfig {
            queue_capacity: self.cache_queue_capacity,
            workers: self.cache_workers,
            job_timeout: Duration::from_millis(self.cache_job_timeout_ms),
        }
    }

    /// Use case tunables; fails when the default page size is out of bounds.
    pub fn use_case_settings(&self) -> Result<UseCaseSettings, PageSizeError> {
        Ok(UseCaseSettings {
            default_page_size: PageSize::try_new(self.default_page_size)?,
            compensation: CompensationPolicy {
                timeout: Duration::from_millis(self.compensation_timeout_ms),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for booking configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 8] = [
        "BOOKING_DATABASE_URL",
        "BOOKING_REDIS_URL",
        "BOOKING_DB_POOL_SIZE",
        "BOOKING_CACHE_QUEUE_CAPACITY",
        "BOOKING_CACHE_WORKERS",
        "BOOKING_CACHE_JOB_TIMEOUT_MS",
        "BOOKING_COMPENSATION_TIMEOUT_MS",
        "BOOKING_DEFAULT_PAGE_SIZE",
    ];

    fn load_from_empty_args() -> BookingSettings {
        BookingSettings::load_from_iter([OsString::from("booking")]).expect("config should load")
    }

    fn cleared_env_with(
        overrides: &[(&'static str, &str)],
    ) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(cleared_env_with(&[]));

        let settings = load_from_empty_args();
        assert!(settings.pool_config().is_none());
        assert!(settings.redis_url.is_none());
        assert_eq!(settings.cache_worker_config(), CacheWorkerConfig::default());
        assert_eq!(
            settings.use_case_settings().expect("default page size"),
            UseCaseSettings::default()
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(cleared_env_with(&[
            ("BOOKING_DATABASE_URL", "postgres://localhost/booking"),
            ("BOOKING_DB_POOL_SIZE", "3"),
            ("BOOKING_CACHE_WORKERS", "2"),
            ("BOOKING_CACHE_JOB_TIMEOUT_MS", "250"),
            ("BOOKING_DEFAULT_PAGE_SIZE", "50"),
        ]));

        let settings = load_from_empty_args();
        let pool = settings.pool_config().expect("database configured");
        assert_eq!(pool.database_url(), "postgres://localhost/booking");
        assert_eq!(pool.max_size(), 3);

        let worker = settings.cache_worker_config();
        assert_eq!(worker.workers, 2);
        assert_eq!(worker.job_timeout, Duration::from_millis(250));

        let use_cases = settings.use_case_settings().expect("valid page size");
        assert_eq!(use_cases.default_page_size.get(), 50);
    }

    #[rstest]
    #[case::zero("0")]
    #[case::above_max("101")]
    fn out_of_range_page_size_is_rejected(#[case] size: &str) {
        let _guard = lock_env(cleared_env_with(&[("BOOKING_DEFAULT_PAGE_SIZE", size)]));

        let settings = load_from_empty_args();
        assert!(settings.use_case_settings().is_err());
    }
}
