//! Builders for slots, appointments and users used across test suites.

use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::domain::ports::CacheQueue;
use crate::domain::{
    Appointment, NewAppointment, NewTrainDate, TimeRange, TrainDate, User, UserId,
};

/// 2026-05-04 at `hour`:00 UTC.
pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Range of `minutes` starting at `start`.
pub fn period(start: DateTime<Utc>, minutes: i64) -> TimeRange {
    TimeRange::new(start, start + Duration::minutes(minutes)).expect("valid range")
}

pub fn coach() -> UserId {
    UserId::new("coach-1").expect("valid id")
}

pub fn parent(id: &str) -> User {
    User::new(id, format!("Parent {id}")).expect("valid user")
}

/// Active one-hour slot with ten seats.
pub fn train_date(id: &str, start: DateTime<Utc>, now: DateTime<Utc>) -> TrainDate {
    train_date_with_capacity(id, start, 10, now)
}

pub fn train_date_with_capacity(
    id: &str,
    start: DateTime<Utc>,
    capacity: u32,
    now: DateTime<Utc>,
) -> TrainDate {
    TrainDate::schedule(
        NewTrainDate {
            id: id.to_owned(),
            coach_id: coach(),
            location: "Main hall".to_owned(),
            capacity,
            period: period(start, 60),
        },
        now,
    )
    .expect("valid slot")
}

/// Confirmed appointment booked at `now`.
pub fn appointment(
    id: &str,
    train_date_id: &str,
    user: &User,
    child_label: &str,
    now: DateTime<Utc>,
) -> Appointment {
    Appointment::book(
        NewAppointment {
            id: id.to_owned(),
            train_date_id: train_date_id.to_owned(),
            user: user.clone(),
            child_label: child_label.to_owned(),
        },
        now,
    )
    .expect("valid appointment")
}

/// Cache queue that remembers every request.
#[derive(Default)]
pub struct RecordingCacheQueue {
    jobs: Mutex<Vec<(String, String)>>,
}

impl RecordingCacheQueue {
    pub fn jobs(&self) -> Vec<(String, String)> {
        self.jobs.lock().expect("jobs mutex").clone()
    }
}

impl CacheQueue for RecordingCacheQueue {
    fn clean(&self, user_id: &str, train_date_id: &str) -> bool {
        self.jobs
            .lock()
            .expect("jobs mutex")
            .push((user_id.to_owned(), train_date_id.to_owned()));
        true
    }
}
