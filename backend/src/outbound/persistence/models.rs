//! Internal Diesel row structs for the booking tables.
//!
//! These types never leave the persistence layer. Rows are turned back into
//! domain entities through the validated `TrainDate::new` and
//! `Appointment::new` constructors, so a corrupt row surfaces as an internal
//! repository error instead of an invalid entity.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::ports::RepositoryError;
use crate::domain::{
    Appointment, AppointmentDraft, AppointmentStatus, LeaveInfo, LeaveStatus, TimeRange,
    TrainDate, TrainDateDraft, TrainDateStatus, User, UserId,
};

use super::schema::{appointments, train_dates};

/// Row struct for reading from the `train_dates` table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = train_dates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TrainDateRow {
    pub id: String,
    pub coach_id: String,
    pub location: String,
    pub max_capacity: i32,
    pub available_capacity: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable and changeset view of a slot.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = train_dates)]
pub(crate) struct TrainDateRecord<'a> {
    pub id: &'a str,
    pub coach_id: &'a str,
    pub location: &'a str,
    pub max_capacity: i32,
    pub available_capacity: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for reading from the `appointments` table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = appointments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AppointmentRow {
    pub id: String,
    pub train_date_id: String,
    pub user_id: String,
    pub user_name: String,
    pub child_label: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub leave_reason: String,
    pub leave_status: String,
    pub leave_created_at: Option<DateTime<Utc>>,
}

/// Insertable view of an appointment.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = appointments)]
pub(crate) struct NewAppointmentRecord<'a> {
    pub id: &'a str,
    pub train_date_id: &'a str,
    pub user_id: &'a str,
    pub user_name: &'a str,
    pub child_label: &'a str,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub leave_reason: &'a str,
    pub leave_status: &'static str,
    pub leave_created_at: Option<DateTime<Utc>>,
}

/// Mutable appointment columns. `None` options are written as NULL.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = appointments)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct AppointmentChangeset<'a> {
    pub status: &'static str,
    pub updated_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub leave_reason: &'a str,
    pub leave_status: &'static str,
    pub leave_created_at: Option<DateTime<Utc>>,
}

fn to_column_count(operation: &str, value: u32) -> Result<i32, RepositoryError> {
    i32::try_from(value)
        .map_err(|_| RepositoryError::internal(operation, format!("seat count {value} overflows")))
}

fn from_column_count(operation: &str, value: i32) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::internal(operation, format!("negative seat count {value}")))
}

fn corrupt(operation: &str, id: &str, err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::internal(operation, format!("stored record {id} is invalid: {err}"))
}

impl<'a> TrainDateRecord<'a> {
    pub(crate) fn from_domain(
        operation: &str,
        train_date: &'a TrainDate,
    ) -> Result<Self, RepositoryError> {
        Ok(Self {
            id: train_date.id(),
            coach_id: train_date.coach_id().as_str(),
            location: train_date.location(),
            max_capacity: to_column_count(operation, train_date.max_capacity())?,
            available_capacity: to_column_count(operation, train_date.available_capacity())?,
            start_time: train_date.period().start(),
            end_time: train_date.period().end(),
            status: train_date.status().as_str(),
            created_at: train_date.created_at(),
            updated_at: train_date.updated_at(),
        })
    }
}

impl TrainDateRow {
    pub(crate) fn into_domain(self, operation: &str) -> Result<TrainDate, RepositoryError> {
        let Self {
            id,
            coach_id,
            location,
            max_capacity,
            available_capacity,
            start_time,
            end_time,
            status,
            created_at,
            updated_at,
        } = self;

        let coach_id = UserId::new(coach_id).map_err(|err| corrupt(operation, &id, err))?;
        let period = TimeRange::new(start_time, end_time).map_err(|err| corrupt(operation, &id, err))?;
        let status: TrainDateStatus = status.parse().map_err(|err| corrupt(operation, &id, err))?;
        let max_capacity = from_column_count(operation, max_capacity)?;
        let available_capacity = from_column_count(operation, available_capacity)?;

        TrainDate::new(TrainDateDraft {
            id: id.clone(),
            coach_id,
            location,
            max_capacity,
            available_capacity,
            period,
            status,
            created_at,
            updated_at,
        })
        .map_err(|err| corrupt(operation, &id, err))
    }
}

impl<'a> NewAppointmentRecord<'a> {
    pub(crate) fn from_domain(appointment: &'a Appointment) -> Self {
        Self {
            id: appointment.id(),
            train_date_id: appointment.train_date_id(),
            user_id: appointment.user().id().as_str(),
            user_name: appointment.user().name(),
            child_label: appointment.child_label(),
            status: appointment.status().as_str(),
            created_at: appointment.created_at(),
            updated_at: appointment.updated_at(),
            verified_at: appointment.verified_at(),
            leave_reason: appointment.leave().reason(),
            leave_status: appointment.leave().status().as_str(),
            leave_created_at: appointment.leave().created_at(),
        }
    }
}

impl<'a> AppointmentChangeset<'a> {
    pub(crate) fn from_domain(appointment: &'a Appointment) -> Self {
        Self {
            status: appointment.status().as_str(),
            updated_at: appointment.updated_at(),
            verified_at: appointment.verified_at(),
            leave_reason: appointment.leave().reason(),
            leave_status: appointment.leave().status().as_str(),
            leave_created_at: appointment.leave().created_at(),
        }
    }
}

impl AppointmentRow {
    pub(crate) fn into_domain(self, operation: &str) -> Result<Appointment, RepositoryError> {
        let Self {
            id,
            train_date_id,
            user_id,
            user_name,
            child_label,
            status,
            created_at,
            updated_at,
            verified_at,
            leave_reason,
            leave_status,
            leave_created_at,
        } = self;

        let user = User::new(user_id, user_name).map_err(|err| corrupt(operation, &id, err))?;
        let status: AppointmentStatus =
            status.parse().map_err(|err| corrupt(operation, &id, err))?;
        let leave_status: LeaveStatus =
            leave_status.parse().map_err(|err| corrupt(operation, &id, err))?;
        let leave = match (leave_status, leave_created_at) {
            (LeaveStatus::None, _) => LeaveInfo::empty(),
            (status, Some(at)) => LeaveInfo::new(leave_reason, status, at),
            (_, None) => return Err(corrupt(operation, &id, "leave record has no timestamp")),
        };

        Appointment::new(AppointmentDraft {
            id: id.clone(),
            train_date_id,
            user,
            child_label,
            status,
            created_at,
            updated_at,
            verified_at,
            leave,
        })
        .map_err(|err| corrupt(operation, &id, err))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for row conversion edge cases.

    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::ports::RepositoryErrorKind;
    use crate::test_support::{appointment, at, parent, train_date};

    #[fixture]
    fn slot_row() -> TrainDateRow {
        TrainDateRow {
            id: "td-1".to_owned(),
            coach_id: "coach-1".to_owned(),
            location: "Main hall".to_owned(),
            max_capacity: 10,
            available_capacity: 4,
            start_time: at(12),
            end_time: at(13),
            status: "ACTIVE".to_owned(),
            created_at: at(6),
            updated_at: at(7),
        }
    }

    #[fixture]
    fn seat_row() -> AppointmentRow {
        AppointmentRow {
            id: "a1".to_owned(),
            train_date_id: "td-1".to_owned(),
            user_id: "u1".to_owned(),
            user_name: "Parent u1".to_owned(),
            child_label: "Mia".to_owned(),
            status: "CANCELLED_LEAVE".to_owned(),
            created_at: at(6),
            updated_at: at(7),
            verified_at: None,
            leave_reason: "sick".to_owned(),
            leave_status: "PENDING".to_owned(),
            leave_created_at: Some(at(7)),
        }
    }

    #[rstest]
    fn slot_row_rehydrates(slot_row: TrainDateRow) {
        let slot = slot_row.into_domain("find").expect("valid row");

        assert_eq!(slot.available_capacity(), 4);
        assert_eq!(slot.booked_count(), 6);
        assert_eq!(slot.status(), TrainDateStatus::Active);
    }

    #[rstest]
    #[case::negative(|row: &mut TrainDateRow| row.available_capacity = -1)]
    #[case::above_max(|row: &mut TrainDateRow| row.available_capacity = 11)]
    #[case::status(|row: &mut TrainDateRow| row.status = "ARCHIVED".to_owned())]
    #[case::period(|row: &mut TrainDateRow| row.end_time = at(11))]
    fn corrupt_slot_rows_are_internal_errors(
        mut slot_row: TrainDateRow,
        #[case] corrupt_row: fn(&mut TrainDateRow),
    ) {
        corrupt_row(&mut slot_row);

        let err = slot_row.into_domain("find").expect_err("corrupt row");
        assert_eq!(err.kind(), RepositoryErrorKind::Internal);
    }

    #[rstest]
    fn slot_record_mirrors_entity() {
        let slot = train_date("td-1", at(12), at(6));
        let record = TrainDateRecord::from_domain("save", &slot).expect("fits columns");

        assert_eq!(record.available_capacity, 10);
        assert_eq!(record.status, "ACTIVE");
        assert_eq!(record.start_time, at(12));
    }

    #[rstest]
    fn appointment_row_keeps_leave(seat_row: AppointmentRow) {
        let seat = seat_row.into_domain("find").expect("valid row");

        assert_eq!(seat.status(), AppointmentStatus::CancelledLeave);
        assert_eq!(seat.leave().reason(), "sick");
        assert_eq!(seat.leave().created_at(), Some(at(7)));
    }

    #[rstest]
    fn leave_without_timestamp_is_rejected(mut seat_row: AppointmentRow) {
        seat_row.leave_created_at = None;

        let err = seat_row.into_domain("find").expect_err("corrupt leave");
        assert_eq!(err.kind(), RepositoryErrorKind::Internal);
    }

    #[rstest]
    fn new_record_writes_empty_leave() {
        let seat = appointment("a1", "td-1", &parent("u1"), "Mia", at(6));
        let record = NewAppointmentRecord::from_domain(&seat);

        assert_eq!(record.status, "CONFIRMED");
        assert_eq!(record.leave_status, "NONE");
        assert_eq!(record.leave_created_at, None);
    }
}
