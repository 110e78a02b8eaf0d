//! Tests for leave requests and withdrawals.

use std::sync::Arc;

use chrono::Duration;
use mockall::predicate::eq;
use rstest::rstest;

use super::*;
use crate::domain::ports::{MockAppointmentRepository, MockTrainRepository, RepositoryError};
use crate::domain::{AppointmentStatus, ErrorCode, LeaveStatus};
use crate::test_support::{MutableClock, RecordingCacheQueue, appointment, at, parent, train_date};

fn booked() -> Appointment {
    appointment("appt-1", "td-1", &parent("user-a"), "Amy", at(6))
}

fn on_leave() -> Appointment {
    let mut appointment = booked();
    appointment
        .append_leave_record("sick", at(12), at(7))
        .expect("leave recorded");
    appointment
}

fn expect_appointment(appointments: &mut MockAppointmentRepository, stored: Appointment) {
    appointments
        .expect_find_appointment_by_id()
        .with(eq("appt-1"))
        .times(1)
        .return_once(move |_| Ok(Some(stored)));
}

fn expect_slot(trains: &mut MockTrainRepository, start_hour: u32) {
    let slot = train_date("td-1", at(start_hour), at(6));
    trains
        .expect_find_train_date_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(slot)));
}

fn create_leave(
    trains: MockTrainRepository,
    appointments: MockAppointmentRepository,
    cache: Arc<RecordingCacheQueue>,
) -> CreateLeave<MockTrainRepository, MockAppointmentRepository> {
    CreateLeave::new(
        Arc::new(trains),
        Arc::new(appointments),
        cache,
        Arc::new(MutableClock::new(at(8))),
    )
}

fn leave_request(user: &str, reason: &str) -> CreateLeaveRequest {
    CreateLeaveRequest {
        appointment_id: "appt-1".to_owned(),
        user_id: UserId::new(user).expect("valid id"),
        reason: reason.to_owned(),
    }
}

#[rstest]
#[tokio::test]
async fn leave_frees_a_seat_and_persists() {
    let mut trains = MockTrainRepository::new();
    expect_slot(&mut trains, 11);
    trains
        .expect_increase_capacity()
        .with(eq("td-1"), eq(1))
        .times(1)
        .return_once(|_, _| Ok(()));
    let mut appointments = MockAppointmentRepository::new();
    expect_appointment(&mut appointments, booked());
    appointments
        .expect_update_appointment()
        .withf(|a| a.status() == AppointmentStatus::CancelledLeave)
        .times(1)
        .return_once(|_| Ok(()));
    let cache = Arc::new(RecordingCacheQueue::default());

    let updated = create_leave(trains, appointments, Arc::clone(&cache))
        .execute(leave_request("user-a", "sick"))
        .await
        .expect("leave recorded");

    assert_eq!(updated.leave().status(), LeaveStatus::Approved);
    assert_eq!(updated.leave().reason(), "sick");
    assert_eq!(cache.jobs().len(), 1);
}

#[rstest]
#[tokio::test]
async fn leave_for_someone_else_is_forbidden_before_slot_lookup() {
    let mut trains = MockTrainRepository::new();
    trains.expect_find_train_date_by_id().never();
    let mut appointments = MockAppointmentRepository::new();
    expect_appointment(&mut appointments, booked());

    let err = create_leave(trains, appointments, Arc::default())
        .execute(leave_request("user-b", "sick"))
        .await
        .expect_err("forbidden");

    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert_eq!(err.reason(), "PERMISSION_DENIED");
}

#[rstest]
#[case("", 11, "leave reason must not be empty")]
#[case("sick", 9, "leave must be requested at least two hours before the start")]
#[tokio::test]
async fn leave_guards_reject_without_touching_capacity(
    #[case] reason: &str,
    #[case] start_hour: u32,
    #[case] message: &str,
) {
    let mut trains = MockTrainRepository::new();
    expect_slot(&mut trains, start_hour);
    trains.expect_increase_capacity().never();
    let mut appointments = MockAppointmentRepository::new();
    expect_appointment(&mut appointments, booked());
    appointments.expect_update_appointment().never();

    let err = create_leave(trains, appointments, Arc::default())
        .execute(leave_request("user-a", reason))
        .await
        .expect_err("guard");

    assert_eq!(err.reason(), "APPEND_LEAVE");
    assert_eq!(err.message(), message);
}

#[rstest]
#[tokio::test]
async fn leave_re_deducts_when_update_fails() {
    let mut trains = MockTrainRepository::new();
    expect_slot(&mut trains, 11);
    trains
        .expect_increase_capacity()
        .times(1)
        .return_once(|_, _| Ok(()));
    trains
        .expect_deduct_capacity()
        .with(eq("td-1"), eq(1))
        .times(1)
        .return_once(|_, _| Ok(()));
    let mut appointments = MockAppointmentRepository::new();
    expect_appointment(&mut appointments, booked());
    appointments
        .expect_update_appointment()
        .times(1)
        .return_once(|_| Err(RepositoryError::internal("update_appointment", "down")));

    let err = create_leave(trains, appointments, Arc::default())
        .execute(leave_request("user-a", "sick"))
        .await
        .expect_err("update failed");

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.reason(), "SAVE_LEAVE");
}

fn cancel_leave(
    trains: MockTrainRepository,
    appointments: MockAppointmentRepository,
) -> CancelLeave<MockTrainRepository, MockAppointmentRepository> {
    CancelLeave::new(
        Arc::new(trains),
        Arc::new(appointments),
        Arc::new(RecordingCacheQueue::default()),
        Arc::new(MutableClock::new(at(8) + Duration::minutes(30))),
    )
}

fn cancel_leave_request(user: &str) -> CancelLeaveRequest {
    CancelLeaveRequest {
        appointment_id: "appt-1".to_owned(),
        user_id: UserId::new(user).expect("valid id"),
    }
}

#[rstest]
#[tokio::test]
async fn cancel_leave_takes_the_seat_back() {
    let mut trains = MockTrainRepository::new();
    trains
        .expect_deduct_capacity()
        .with(eq("td-1"), eq(1))
        .times(1)
        .return_once(|_, _| Ok(()));
    let mut appointments = MockAppointmentRepository::new();
    expect_appointment(&mut appointments, on_leave());
    appointments
        .expect_update_appointment()
        .withf(|a| a.status() == AppointmentStatus::Confirmed && a.leave().is_empty())
        .times(1)
        .return_once(|_| Ok(()));

    let restored = cancel_leave(trains, appointments)
        .execute(cancel_leave_request("user-a"))
        .await
        .expect("leave withdrawn");

    assert_eq!(restored.status(), AppointmentStatus::Confirmed);
}

#[rstest]
#[tokio::test]
async fn cancel_leave_fails_when_the_seat_is_gone() {
    let mut trains = MockTrainRepository::new();
    trains.expect_deduct_capacity().times(1).return_once(|_, _| {
        Err(RepositoryError::capacity_not_enough("deduct_capacity", "td-1"))
    });
    let mut appointments = MockAppointmentRepository::new();
    expect_appointment(&mut appointments, on_leave());
    appointments.expect_update_appointment().never();

    let err = cancel_leave(trains, appointments)
        .execute(cancel_leave_request("user-a"))
        .await
        .expect_err("no seat");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.reason(), "DEDUCT_CAPACITY");
}

#[rstest]
#[tokio::test]
async fn cancel_leave_returns_the_seat_when_update_fails() {
    let mut trains = MockTrainRepository::new();
    trains
        .expect_deduct_capacity()
        .times(1)
        .return_once(|_, _| Ok(()));
    trains
        .expect_increase_capacity()
        .with(eq("td-1"), eq(1))
        .times(1)
        .return_once(|_, _| Ok(()));
    let mut appointments = MockAppointmentRepository::new();
    expect_appointment(&mut appointments, on_leave());
    appointments
        .expect_update_appointment()
        .times(1)
        .return_once(|_| Err(RepositoryError::internal("update_appointment", "down")));

    let err = cancel_leave(trains, appointments)
        .execute(cancel_leave_request("user-a"))
        .await
        .expect_err("update failed");

    assert_eq!(err.reason(), "UPDATE_APPOINTMENT");
}

#[rstest]
#[tokio::test]
async fn cancel_leave_on_a_confirmed_booking_is_rejected() {
    let mut trains = MockTrainRepository::new();
    trains.expect_deduct_capacity().never();
    let mut appointments = MockAppointmentRepository::new();
    expect_appointment(&mut appointments, booked());

    let err = cancel_leave(trains, appointments)
        .execute(cancel_leave_request("user-a"))
        .await
        .expect_err("not on leave");

    assert_eq!(err.code(), ErrorCode::Conflict);
}
