//! Port for handing cache invalidation off the write path.

/// Non-blocking sink for cache invalidation requests.
///
/// Implementations must never wait: when the backlog is full the request is
/// dropped, since only cache freshness depends on it.
#[cfg_attr(test, mockall::automock)]
pub trait CacheQueue: Send + Sync {
    /// Ask for the caches of `user_id` touched by `train_date_id` to be
    /// cleared. Returns `false` when the request was dropped.
    fn clean(&self, user_id: &str, train_date_id: &str) -> bool;
}
