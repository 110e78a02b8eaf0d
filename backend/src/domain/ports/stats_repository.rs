//! Port for read-only attendance aggregates.

use async_trait::async_trait;

use crate::domain::{UserApptStats, UserId};

use super::{RepositoryError, StatsFilter};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Statistics for every user with bookings matching `filter`.
    async fn all_user_stats(
        &self,
        filter: &StatsFilter,
    ) -> Result<Vec<UserApptStats>, RepositoryError>;

    /// Statistics for one user; `None` when the user has no matching bookings.
    async fn user_stats(
        &self,
        user_id: &UserId,
        filter: &StatsFilter,
    ) -> Result<Option<UserApptStats>, RepositoryError>;
}
