//! Keys of the cached per-user aggregates cleared by the cache worker.
use std::fmt;

use thiserror::Error;

use crate::domain::UserId;

/// Key of one user's monthly statistics: `booking:stats:{user}:{yyyy}-{mm}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatsCacheKey(String);

impl StatsCacheKey {
    /// Build the key after checking that `month` is a calendar month.
    pub fn new(user_id: &UserId, year: i32, month: u32) -> Result<Self, CacheKeyValidationError> {
        if !(1..=12).contains(&month) {
            return Err(CacheKeyValidationError::InvalidMonth(month));
        }
        Ok(Self(format!("booking:stats:{user_id}:{year:04}-{month:02}")))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Key of one user's cached schedule: `booking:train:{user}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrainCacheKey(String);

impl TrainCacheKey {
    pub fn new(user_id: &UserId) -> Self {
        Self(format!("booking:train:{user_id}"))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for StatsCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TrainCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors returned when building cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheKeyValidationError {
    #[error("month {0} is outside 1..=12")]
    InvalidMonth(u32),
}

#[cfg(test)]
mod tests {
    //! Validates key layout and month bounds.
    use super::*;
    use rstest::rstest;

    fn user() -> UserId {
        UserId::new("u-42").expect("valid id")
    }

    #[rstest]
    #[case(0)]
    #[case(13)]
    fn stats_key_rejects_out_of_range_month(#[case] month: u32) {
        let err = StatsCacheKey::new(&user(), 2026, month).expect_err("month rejected");
        assert_eq!(err, CacheKeyValidationError::InvalidMonth(month));
    }

    #[rstest]
    fn stats_key_pads_month() {
        let key = StatsCacheKey::new(&user(), 2026, 5).expect("valid key");
        assert_eq!(key.as_str(), "booking:stats:u-42:2026-05");
    }

    #[rstest]
    fn train_key_is_per_user() {
        assert_eq!(TrainCacheKey::new(&user()).to_string(), "booking:train:u-42");
    }
}
