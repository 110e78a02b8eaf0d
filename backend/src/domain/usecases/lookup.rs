//! Shared lookups that turn a missing record into `NotFound`.

use crate::domain::ports::{AppointmentRepository, TrainRepository};
use crate::domain::{Appointment, Error, TrainDate, TrainDateStatus};

pub(super) async fn require_appointment<A>(
    repo: &A,
    use_case: &'static str,
    id: &str,
) -> Result<Appointment, Error>
where
    A: AppointmentRepository + ?Sized,
{
    repo.find_appointment_by_id(id)
        .await
        .map_err(|err| Error::wrap(use_case, "FIND_APPOINTMENT", err))?
        .ok_or_else(|| {
            Error::not_found(
                use_case,
                "APPOINTMENT_NOT_FOUND",
                format!("appointment {id} not found"),
            )
        })
}

/// Active slot `id`; inactive slots are reported as missing.
pub(super) async fn require_train_date<T>(
    repo: &T,
    use_case: &'static str,
    id: &str,
) -> Result<TrainDate, Error>
where
    T: TrainRepository + ?Sized,
{
    repo.find_train_date_by_id(id)
        .await
        .map_err(|err| Error::wrap(use_case, "FIND_TRAIN_DATE", err))?
        .filter(|train_date| train_date.status() == TrainDateStatus::Active)
        .ok_or_else(|| {
            Error::not_found(
                use_case,
                "TRAIN_DATE_NOT_FOUND",
                format!("train date {id} not found"),
            )
        })
}
