//! Port for slot persistence, overlap checks, and the atomic capacity counter.

use async_trait::async_trait;

use crate::domain::{
    TimeRange, TrainDate, TrainDateWithAppointments, UserId, UserTrainDateView,
};

use super::{RepositoryError, TrainDateFilter};

/// Slot storage.
///
/// `deduct_capacity` and `increase_capacity` are the only cross-request
/// coordination points: each must be a single store-level conditional
/// update. Query methods return active slots ordered by start time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrainRepository: Send + Sync {
    /// Insert a new slot.
    async fn save_train_date(&self, train_date: &TrainDate) -> Result<(), RepositoryError>;

    /// Insert several slots in one write.
    async fn save_many_train_dates(&self, train_dates: &[TrainDate])
    -> Result<(), RepositoryError>;

    /// Overwrite descriptive fields and status of existing slots.
    async fn update_many_train_dates(
        &self,
        train_dates: &[TrainDate],
    ) -> Result<(), RepositoryError>;

    /// Mark the slot inactive, but only while every seat is free.
    ///
    /// The seat check runs against the stored counter in the same update,
    /// so a booking that lands after the caller read the slot wins: the
    /// call then fails with `Conflict` and the slot stays active.
    async fn delete_train_date(&self, train_date: &TrainDate) -> Result<(), RepositoryError>;

    async fn find_train_date_by_id(&self, id: &str) -> Result<Option<TrainDate>, RepositoryError>;

    async fn find_train_dates(
        &self,
        filter: &TrainDateFilter,
    ) -> Result<Vec<TrainDate>, RepositoryError>;

    /// Admin projection: slots with all their seats.
    async fn query_train_dates_with_appointments(
        &self,
        filter: &TrainDateFilter,
    ) -> Result<Vec<TrainDateWithAppointments>, RepositoryError>;

    /// User projection: slots with the user's own seats.
    async fn user_query_train_dates(
        &self,
        user_id: &UserId,
        filter: &TrainDateFilter,
    ) -> Result<Vec<UserTrainDateView>, RepositoryError>;

    /// True when an active slot of `coach_id` overlaps `period`.
    async fn check_overlap(
        &self,
        coach_id: &UserId,
        period: &TimeRange,
    ) -> Result<bool, RepositoryError>;

    /// True when an active slot of `coach_id` overlaps any of `periods`, in
    /// one round trip.
    async fn has_any_overlap(
        &self,
        coach_id: &UserId,
        periods: &[TimeRange],
    ) -> Result<bool, RepositoryError>;

    /// Atomically take `count` seats of an active slot; fails with
    /// `CapacityNotEnough` rather than going negative. Inactive slots are
    /// `NotFound`.
    async fn deduct_capacity(&self, id: &str, count: u32) -> Result<(), RepositoryError>;

    /// Atomically return `count` seats, saturating at max capacity.
    async fn increase_capacity(&self, id: &str, count: u32) -> Result<(), RepositoryError>;
}
