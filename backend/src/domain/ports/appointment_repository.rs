//! Port for appointment persistence and the paginated booking listing.

use async_trait::async_trait;
use pagination::Page;

use crate::domain::{Appointment, AppointmentWithTrainDate};

use super::{AppointmentFilter, RepositoryError, TrainDateFilter};

/// Appointment storage.
///
/// Inserts must enforce the `(user, slot, child label)` uniqueness key and
/// report violations as `Conflict`. Deletion is refused unless the entity is
/// already cancelled.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn save_appointment(&self, appointment: &Appointment) -> Result<(), RepositoryError>;

    /// Insert all appointments or none.
    async fn save_many_appointments(
        &self,
        appointments: &[Appointment],
    ) -> Result<(), RepositoryError>;

    async fn delete_appointment(&self, appointment: &Appointment) -> Result<(), RepositoryError>;

    async fn update_appointment(&self, appointment: &Appointment) -> Result<(), RepositoryError>;

    /// Update all appointments or none.
    async fn update_many_appointments(
        &self,
        appointments: &[Appointment],
    ) -> Result<(), RepositoryError>;

    async fn find_appointment_by_id(
        &self,
        id: &str,
    ) -> Result<Option<Appointment>, RepositoryError>;

    async fn find_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, RepositoryError>;

    /// Keyset page of appointments joined with their slots, ordered by slot
    /// start then appointment id. `cursor` must be a token produced by
    /// [`pagination::Cursor::encode`]; anything else is `InvalidCursor`.
    async fn page_find_with_train_date(
        &self,
        appointment_filter: &AppointmentFilter,
        train_date_filter: &TrainDateFilter,
        cursor: &str,
    ) -> Result<Page<AppointmentWithTrainDate>, RepositoryError>;
}
