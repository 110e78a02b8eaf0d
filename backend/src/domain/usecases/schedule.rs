//! Two-week calendar view of a user's slots, grouped by ISO week.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

use super::UseCase;
use crate::domain::ports::{TrainDateFilter, TrainRepository};
use crate::domain::{BookedSeat, Error, TimeRange, TrainDateSummary, UserId, UserTrainDateView};

const DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleDirection {
    /// The fourteen days after the reference date.
    Next,
    /// The fourteen days before the reference date.
    Previous,
}

impl ScheduleDirection {
    fn window(self, reference: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            Self::Previous => {
                let end = reference - Duration::days(1);
                (end - Duration::days(DAYS - 1), end)
            }
            Self::Next => {
                let start = reference + Duration::days(1);
                (start, start + Duration::days(DAYS - 1))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTwoWeeksScheduleRequest {
    pub user_id: UserId,
    pub reference_date: NaiveDate,
    pub direction: ScheduleDirection,
}

/// How one of the caller's bookings stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendeeStatus {
    Booked,
    Leave,
    CheckedIn,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleAttendee {
    pub appointment_id: String,
    pub child_label: String,
    pub status: AttendeeStatus,
    pub booked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSlot {
    #[serde(flatten)]
    pub train_date: TrainDateSummary,
    pub booked_count: u32,
    pub is_full: bool,
    pub attendees: Vec<ScheduleAttendee>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub weekday: String,
    pub is_today: bool,
    pub slots: Vec<ScheduleSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSchedule {
    /// ISO week label such as `2026-W19`.
    pub id: String,
    pub is_current: bool,
    pub days: Vec<DaySchedule>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoWeeksSchedule {
    pub weeks: Vec<WeekSchedule>,
}

fn iso_week_id(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

fn attendee(seat: &BookedSeat, slot_end: DateTime<Utc>, now: DateTime<Utc>) -> ScheduleAttendee {
    let status = if seat.is_on_leave {
        AttendeeStatus::Leave
    } else if seat.is_checked_in {
        AttendeeStatus::CheckedIn
    } else if now > slot_end {
        AttendeeStatus::Absent
    } else {
        AttendeeStatus::Booked
    };
    ScheduleAttendee {
        appointment_id: seat.id.clone(),
        child_label: seat.child_label.clone(),
        status,
        booked_at: seat.created_at,
    }
}

fn schedule_slot(view: UserTrainDateView, now: DateTime<Utc>) -> ScheduleSlot {
    let end = view.train_date.end;
    ScheduleSlot {
        booked_count: view
            .train_date
            .capacity
            .saturating_sub(view.train_date.available_capacity),
        is_full: view.train_date.available_capacity == 0,
        attendees: view
            .my_appointments
            .iter()
            .map(|seat| attendee(seat, end, now))
            .collect(),
        train_date: view.train_date,
    }
}

/// Lay `views` out over every day from `first` to `last`, inclusive.
fn group_by_week(
    views: Vec<UserTrainDateView>,
    first: NaiveDate,
    last: NaiveDate,
    now: DateTime<Utc>,
) -> TwoWeeksSchedule {
    let today = now.date_naive();
    let mut by_day: BTreeMap<NaiveDate, Vec<ScheduleSlot>> = BTreeMap::new();
    for view in views {
        by_day
            .entry(view.train_date.start.date_naive())
            .or_default()
            .push(schedule_slot(view, now));
    }

    let mut weeks: Vec<WeekSchedule> = Vec::new();
    for date in first.iter_days().take_while(|date| *date <= last) {
        let mut slots = by_day.remove(&date).unwrap_or_default();
        slots.sort_by(|a, b| {
            a.train_date
                .start
                .cmp(&b.train_date.start)
                .then_with(|| a.train_date.id.cmp(&b.train_date.id))
        });
        let day = DaySchedule {
            date,
            weekday: date.format("%a").to_string(),
            is_today: date == today,
            slots,
        };
        let id = iso_week_id(date);
        match weeks.last_mut() {
            Some(week) if week.id == id => {
                week.is_current |= day.is_today;
                week.days.push(day);
            }
            _ => weeks.push(WeekSchedule {
                id,
                is_current: day.is_today,
                days: vec![day],
            }),
        }
    }
    TwoWeeksSchedule { weeks }
}

pub struct QueryTwoWeeksSchedule<T> {
    trains: Arc<T>,
    clock: Arc<dyn Clock>,
}

impl<T> QueryTwoWeeksSchedule<T> {
    pub fn new(trains: Arc<T>, clock: Arc<dyn Clock>) -> Self {
        Self { trains, clock }
    }
}

#[async_trait]
impl<T: TrainRepository> UseCase for QueryTwoWeeksSchedule<T> {
    type Request = QueryTwoWeeksScheduleRequest;
    type Response = TwoWeeksSchedule;

    fn name(&self) -> &'static str {
        "QueryTwoWeeksSchedule"
    }

    async fn execute(&self, request: Self::Request) -> Result<Self::Response, Error> {
        let name = self.name();
        let (first, last) = request.direction.window(request.reference_date);
        let window_start = first.and_time(chrono::NaiveTime::MIN).and_utc();
        let window_end = (last + Duration::days(1)).and_time(chrono::NaiveTime::MIN).and_utc()
            - Duration::seconds(1);
        let window = TimeRange::new(window_start, window_end)
            .map_err(|err| Error::wrap(name, "INVALID_WINDOW", err))?;

        let views = self
            .trains
            .user_query_train_dates(&request.user_id, &TrainDateFilter::Within(window))
            .await
            .map_err(|err| Error::wrap(name, "QUERY_TRAIN_DATES", err))?;
        Ok(group_by_week(views, first, last, self.clock.utc()))
    }
}
