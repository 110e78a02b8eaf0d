//! Port for invalidating cached per-user aggregates.
use async_trait::async_trait;

use crate::domain::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by the cache adapter.
    pub enum BookingCacheError {
        /// Cache backend is unavailable or timing out.
        Backend { message: String } => "booking cache backend failure: {message}",
    }
}

/// Idempotent cache invalidation. Deleting an absent entry succeeds.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingCache: Send + Sync {
    /// Drop the monthly statistics entry of `user_id`.
    async fn clean_stats_cache(
        &self,
        user_id: &UserId,
        year: i32,
        month: u32,
    ) -> Result<(), BookingCacheError>;

    /// Drop the schedule entry of `user_id`.
    async fn clean_train_cache(&self, user_id: &UserId) -> Result<(), BookingCacheError>;
}

/// Cache used when no cache backend is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBookingCache;

#[async_trait]
impl BookingCache for NoopBookingCache {
    async fn clean_stats_cache(
        &self,
        _user_id: &UserId,
        _year: i32,
        _month: u32,
    ) -> Result<(), BookingCacheError> {
        Ok(())
    }

    async fn clean_train_cache(&self, _user_id: &UserId) -> Result<(), BookingCacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn noop_cache_accepts_every_invalidation() {
        let cache = NoopBookingCache;
        let user = UserId::new("u-1").expect("valid id");
        cache
            .clean_stats_cache(&user, 2026, 3)
            .await
            .expect("noop stats clean");
        cache.clean_train_cache(&user).await.expect("noop train clean");
    }

    #[rstest]
    fn backend_errors_render_message() {
        let err = BookingCacheError::backend("connection reset");
        assert_eq!(
            err.to_string(),
            "booking cache backend failure: connection reset"
        );
    }
}
