//! Closed sets of query filters accepted by the repository ports.
//!
//! Adapters dispatch with an exhaustive `match`, so adding a filter kind is a
//! compile error in every adapter until it is handled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Appointment, TimeRange, TrainDate, UserId};

/// Slot selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainDateFilter {
    /// Slots with any of these ids.
    Ids(Vec<String>),
    /// Slots starting at or after the instant.
    StartsFrom(DateTime<Utc>),
    /// Slots fully inside the window: `start >= window.start`, `end <= window.end`.
    Within(TimeRange),
    /// Slots still running or upcoming at the instant: `end > instant`.
    EndsAfter(DateTime<Utc>),
}

impl TrainDateFilter {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::Ids(vec![id.into()])
    }

    pub fn matches(&self, train_date: &TrainDate) -> bool {
        let period = train_date.period();
        match self {
            Self::Ids(ids) => ids.iter().any(|id| id == train_date.id()),
            Self::StartsFrom(instant) => period.start() >= *instant,
            Self::Within(window) => {
                period.start() >= window.start() && period.end() <= window.end()
            }
            Self::EndsAfter(instant) => period.end() > *instant,
        }
    }
}

/// Appointment selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppointmentFilter {
    ByTrainDate(String),
    ByIds(Vec<String>),
    ByUser(UserId),
}

impl AppointmentFilter {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        match self {
            Self::ByTrainDate(id) => appointment.train_date_id() == id,
            Self::ByIds(ids) => ids.iter().any(|id| id == appointment.id()),
            Self::ByUser(user_id) => appointment.belongs_to(user_id),
        }
    }
}

/// Statistics selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsFilter {
    /// Appointments whose slot starts inside the closed window.
    TrainTimeRange(TimeRange),
}

impl StatsFilter {
    pub fn matches(&self, train_date: &TrainDate) -> bool {
        match self {
            Self::TrainTimeRange(window) => window.contains(train_date.period().start()),
        }
    }
}

/// Keyset position for appointment pages: slot start, then appointment id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppointmentPageKey {
    #[serde(rename = "s")]
    pub start: DateTime<Utc>,
    #[serde(rename = "i")]
    pub id: String,
}

impl AppointmentPageKey {
    pub fn new(start: DateTime<Utc>, id: impl Into<String>) -> Self {
        Self {
            start,
            id: id.into(),
        }
    }
}
