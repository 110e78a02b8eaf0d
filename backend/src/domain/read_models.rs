//! Plain-data projections returned by the read use cases.
//!
//! These are assembled by repository adapters from stored slots and
//! appointments. They carry no behaviour beyond construction helpers, so the
//! in-memory and database adapters produce identical shapes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Appointment, AppointmentStatus, LeaveInfo, TrainDate};

/// Slot fields shown alongside bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainDateSummary {
    pub id: String,
    pub coach_id: String,
    pub location: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub capacity: u32,
    pub available_capacity: u32,
}

impl From<&TrainDate> for TrainDateSummary {
    fn from(value: &TrainDate) -> Self {
        Self {
            id: value.id().to_owned(),
            coach_id: value.coach_id().to_string(),
            location: value.location().to_owned(),
            start: value.period().start(),
            end: value.period().end(),
            capacity: value.max_capacity(),
            available_capacity: value.available_capacity(),
        }
    }
}

/// A booking joined with its slot, as listed on a user's booking page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentWithTrainDate {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub child_label: String,
    pub status: AppointmentStatus,
    pub is_on_leave: bool,
    pub is_checked_in: bool,
    pub created_at: DateTime<Utc>,
    pub leave: LeaveInfo,
    pub train_date: TrainDateSummary,
}

impl AppointmentWithTrainDate {
    pub fn from_parts(appointment: &Appointment, train_date: &TrainDate) -> Self {
        Self {
            id: appointment.id().to_owned(),
            user_id: appointment.user().id().to_string(),
            user_name: appointment.user().name().to_owned(),
            child_label: appointment.child_label().to_owned(),
            status: appointment.status(),
            is_on_leave: appointment.is_on_leave(),
            is_checked_in: appointment.is_checked_in(),
            created_at: appointment.created_at(),
            leave: appointment.leave().clone(),
            train_date: TrainDateSummary::from(train_date),
        }
    }
}

/// One seat inside a slot listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedSeat {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub child_label: String,
    pub created_at: DateTime<Utc>,
    pub is_checked_in: bool,
    pub is_on_leave: bool,
}

impl From<&Appointment> for BookedSeat {
    fn from(value: &Appointment) -> Self {
        Self {
            id: value.id().to_owned(),
            user_id: value.user().id().to_string(),
            user_name: value.user().name().to_owned(),
            child_label: value.child_label().to_owned(),
            created_at: value.created_at(),
            is_checked_in: value.is_checked_in(),
            is_on_leave: value.is_on_leave(),
        }
    }
}

/// Admin view: a slot with every seat booked against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainDateWithAppointments {
    #[serde(flatten)]
    pub train_date: TrainDateSummary,
    pub appointments: Vec<BookedSeat>,
}

impl TrainDateWithAppointments {
    pub fn from_parts<'a>(
        train_date: &TrainDate,
        appointments: impl IntoIterator<Item = &'a Appointment>,
    ) -> Self {
        Self {
            train_date: TrainDateSummary::from(train_date),
            appointments: appointments.into_iter().map(BookedSeat::from).collect(),
        }
    }
}

/// User view: a slot with the caller's own seats and the labels of the
/// other attendees who are not on leave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTrainDateView {
    #[serde(flatten)]
    pub train_date: TrainDateSummary,
    pub my_appointments: Vec<BookedSeat>,
    pub attendees: Vec<String>,
}

impl UserTrainDateView {
    pub fn from_parts<'a>(
        user_id: &str,
        train_date: &TrainDate,
        appointments: impl IntoIterator<Item = &'a Appointment>,
    ) -> Self {
        let mut my_appointments = Vec::new();
        let mut attendees = Vec::new();
        for appointment in appointments {
            if appointment.user().id().as_str() == user_id {
                my_appointments.push(BookedSeat::from(appointment));
            }
            if !appointment.is_on_leave() {
                attendees.push(appointment.child_label().to_owned());
            }
        }
        Self {
            train_date: TrainDateSummary::from(train_date),
            my_appointments,
            attendees,
        }
    }
}

/// One attended-or-not entry inside a child's statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsEntry {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: String,
    pub capacity: u32,
    pub is_checked_in: bool,
    pub is_on_leave: bool,
}

/// Per-child attendance counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildStats {
    pub child_label: String,
    pub appointments: Vec<StatsEntry>,
    pub checked_in_count: u32,
    pub on_leave_count: u32,
}

/// Per-user attendance counters over a time range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserApptStats {
    pub user_id: String,
    pub user_name: String,
    pub children: Vec<ChildStats>,
    pub checked_in_count: u32,
    pub on_leave_count: u32,
    pub total_appointments: u32,
}

impl UserApptStats {
    /// Fold booking rows into per-user statistics.
    ///
    /// Entries inside a child are ordered by slot start; users are ordered
    /// by name then id and children by label.
    pub fn aggregate<'a, I>(rows: I) -> Vec<Self>
    where
        I: IntoIterator<Item = (&'a Appointment, &'a TrainDate)>,
    {
        let mut rows: Vec<_> = rows.into_iter().collect();
        rows.sort_by(|(left, left_slot), (right, right_slot)| {
            left_slot
                .period()
                .start()
                .cmp(&right_slot.period().start())
                .then_with(|| left.id().cmp(right.id()))
        });

        let mut users: BTreeMap<(String, String), BTreeMap<String, ChildStats>> = BTreeMap::new();
        for (appointment, train_date) in rows {
            let user_key = (
                appointment.user().name().to_owned(),
                appointment.user().id().to_string(),
            );
            let child = users
                .entry(user_key)
                .or_default()
                .entry(appointment.child_label().to_owned())
                .or_insert_with(|| ChildStats {
                    child_label: appointment.child_label().to_owned(),
                    appointments: Vec::new(),
                    checked_in_count: 0,
                    on_leave_count: 0,
                });
            child.checked_in_count += u32::from(appointment.is_checked_in());
            child.on_leave_count += u32::from(appointment.is_on_leave());
            child.appointments.push(StatsEntry {
                start: train_date.period().start(),
                end: train_date.period().end(),
                location: train_date.location().to_owned(),
                capacity: train_date.max_capacity(),
                is_checked_in: appointment.is_checked_in(),
                is_on_leave: appointment.is_on_leave(),
            });
        }

        users
            .into_iter()
            .map(|((user_name, user_id), children)| {
                let children: Vec<ChildStats> = children.into_values().collect();
                Self {
                    user_id,
                    user_name,
                    checked_in_count: children.iter().map(|c| c.checked_in_count).sum(),
                    on_leave_count: children.iter().map(|c| c.on_leave_count).sum(),
                    total_appointments: children
                        .iter()
                        .map(|c| u32::try_from(c.appointments.len()).unwrap_or(u32::MAX))
                        .sum(),
                    children,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use super::*;
    use crate::domain::{NewAppointment, NewTrainDate, TimeRange, User, UserId};
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn slot(id: &str, start_hour: u32) -> TrainDate {
        let start = Utc
            .with_ymd_and_hms(2026, 7, 1, start_hour, 0, 0)
            .single()
            .expect("valid timestamp");
        TrainDate::schedule(
            NewTrainDate {
                id: id.to_owned(),
                coach_id: UserId::new("coach").expect("valid coach"),
                location: "Court".to_owned(),
                capacity: 6,
                period: TimeRange::new(start, start + Duration::hours(1)).expect("valid period"),
            },
            start - Duration::days(3),
        )
        .expect("valid slot")
    }

    fn booking(id: &str, slot: &TrainDate, user: &User, child: &str) -> Appointment {
        Appointment::book(
            NewAppointment {
                id: id.to_owned(),
                train_date_id: slot.id().to_owned(),
                user: user.clone(),
                child_label: child.to_owned(),
            },
            slot.period().start() - Duration::days(2),
        )
        .expect("valid booking")
    }

    #[rstest]
    fn aggregate_groups_by_user_then_child() {
        let ada = User::new("u-ada", "Ada").expect("valid user");
        let bob = User::new("u-bob", "Bob").expect("valid user");
        let early = slot("td-early", 8);
        let late = slot("td-late", 10);

        let mut attended = booking("a1", &early, &ada, "Mia");
        attended
            .mark_as_attended(early.period().start(), early.period().start())
            .expect("check in");
        let mut on_leave = booking("a2", &late, &ada, "Mia");
        on_leave
            .append_leave_record("fever", late.period().start(), late.period().start() - Duration::hours(3))
            .expect("leave");
        let sibling = booking("a3", &late, &ada, "Leo");
        let other = booking("b1", &early, &bob, "Kai");

        let stats = UserApptStats::aggregate([
            (&on_leave, &late),
            (&attended, &early),
            (&sibling, &late),
            (&other, &early),
        ]);

        assert_eq!(stats.len(), 2);
        let ada_stats = stats.first().expect("ada stats");
        assert_eq!(ada_stats.user_id, "u-ada");
        assert_eq!(ada_stats.total_appointments, 3);
        assert_eq!(ada_stats.checked_in_count, 1);
        assert_eq!(ada_stats.on_leave_count, 1);
        let labels: Vec<&str> = ada_stats
            .children
            .iter()
            .map(|c| c.child_label.as_str())
            .collect();
        assert_eq!(labels, ["Leo", "Mia"]);
        let mia = ada_stats.children.get(1).expect("mia stats");
        let starts: Vec<DateTime<Utc>> = mia.appointments.iter().map(|e| e.start).collect();
        assert_eq!(starts, [early.period().start(), late.period().start()]);
    }

    #[rstest]
    fn user_view_separates_own_seats_from_attendees() {
        let ada = User::new("u-ada", "Ada").expect("valid user");
        let bob = User::new("u-bob", "Bob").expect("valid user");
        let slot = slot("td-1", 9);
        let mine = booking("a1", &slot, &ada, "Mia");
        let mut away = booking("b1", &slot, &bob, "Kai");
        away.append_leave_record("trip", slot.period().start(), slot.period().start() - Duration::hours(5))
            .expect("leave");
        let present = booking("b2", &slot, &bob, "Noa");

        let view = UserTrainDateView::from_parts("u-ada", &slot, [&mine, &away, &present]);

        assert_eq!(view.my_appointments.len(), 1);
        assert_eq!(view.attendees, ["Mia", "Noa"]);
    }
}
