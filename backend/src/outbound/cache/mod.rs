//! Redis-backed invalidation of cached per-user aggregates.
//!
//! Readers outside this crate cache monthly statistics and schedules under
//! [`StatsCacheKey`] and [`TrainCacheKey`]. This adapter only deletes those
//! keys; deleting an absent key is a successful no-op, so jobs may repeat.

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::Pool;
use bb8_redis::redis;
use tracing::debug;

use crate::domain::UserId;
use crate::domain::ports::{BookingCache, BookingCacheError, StatsCacheKey, TrainCacheKey};

/// Cache adapter that deletes Redis keys through a `bb8` pool.
#[derive(Clone)]
pub struct RedisBookingCache {
    pool: Pool<RedisConnectionManager>,
}

impl RedisBookingCache {
    /// Connect a pool of `max_size` multiplexed connections to `redis_url`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingCacheError::Backend`] for a malformed URL or an
    /// unreachable server.
    pub async fn connect(redis_url: &str, max_size: u32) -> Result<Self, BookingCacheError> {
        let manager = RedisConnectionManager::new(redis_url)
            .map_err(|err| BookingCacheError::backend(err.to_string()))?;
        let pool = Pool::builder()
            .max_size(max_size.max(1))
            .build(manager)
            .await
            .map_err(|err| BookingCacheError::backend(err.to_string()))?;
        Ok(Self { pool })
    }

    async fn delete(&self, key: &str) -> Result<(), BookingCacheError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| BookingCacheError::backend(err.to_string()))?;
        let removed: u64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut *conn)
            .await
            .map_err(|err| BookingCacheError::backend(err.to_string()))?;
        debug!(key, removed, "cache key deleted");
        Ok(())
    }
}

#[async_trait]
impl BookingCache for RedisBookingCache {
    async fn clean_stats_cache(
        &self,
        user_id: &UserId,
        year: i32,
        month: u32,
    ) -> Result<(), BookingCacheError> {
        let key = StatsCacheKey::new(user_id, year, month)
            .map_err(|err| BookingCacheError::backend(err.to_string()))?;
        self.delete(key.as_str()).await
    }

    async fn clean_train_cache(&self, user_id: &UserId) -> Result<(), BookingCacheError> {
        self.delete(TrainCacheKey::new(user_id).as_str()).await
    }
}
