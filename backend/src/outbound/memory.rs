//! Process-local implementation of the booking repository ports.
//!
//! One mutex guards slots and appointments together, so every capacity
//! operation is a single compare-and-update with respect to concurrent
//! callers. The store backs the binary when no database is configured and
//! the integration tests, which can inject one-shot failures per operation.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use pagination::Page;

use crate::domain::ports::{
    AppointmentFilter, AppointmentPageKey, AppointmentRepository, RepositoryError,
    StatsFilter, StatsRepository, TrainDateFilter, TrainRepository, decode_appointment_cursor,
};
use crate::domain::{
    Appointment, AppointmentStatus, AppointmentWithTrainDate, TimeRange, TrainDate,
    TrainDateStatus, TrainDateWithAppointments, UserApptStats, UserId, UserTrainDateView,
};

#[derive(Debug, Default)]
struct StoreState {
    train_dates: BTreeMap<String, TrainDate>,
    appointments: BTreeMap<String, Appointment>,
    failures: HashMap<String, usize>,
}

impl StoreState {
    /// Consume one injected failure for `operation`, if any is armed.
    fn take_failure(&mut self, operation: &str) -> Result<(), RepositoryError> {
        let Some(remaining) = self.failures.get_mut(operation) else {
            return Ok(());
        };
        *remaining -= 1;
        if *remaining == 0 {
            self.failures.remove(operation);
        }
        Err(RepositoryError::internal(operation, "injected failure"))
    }

    fn active_slots<'a>(
        &'a self,
        filter: &'a TrainDateFilter,
    ) -> impl Iterator<Item = &'a TrainDate> + 'a {
        let mut slots: Vec<_> = self
            .train_dates
            .values()
            .filter(|slot| slot.status() == TrainDateStatus::Active && filter.matches(slot))
            .collect();
        slots.sort_by(|left, right| {
            left.period()
                .start()
                .cmp(&right.period().start())
                .then_with(|| left.id().cmp(right.id()))
        });
        slots.into_iter()
    }

    fn appointments_for<'a>(&'a self, train_date_id: &'a str) -> Vec<&'a Appointment> {
        let mut seats: Vec<_> = self
            .appointments
            .values()
            .filter(|appointment| appointment.train_date_id() == train_date_id)
            .collect();
        seats.sort_by(|left, right| {
            left.created_at()
                .cmp(&right.created_at())
                .then_with(|| left.id().cmp(right.id()))
        });
        seats
    }

    fn coach_overlaps(&self, coach_id: &UserId, period: &TimeRange) -> bool {
        self.train_dates.values().any(|slot| {
            slot.status() == TrainDateStatus::Active
                && slot.coach_id() == coach_id
                && slot.period().overlaps(period)
        })
    }

    fn seat_taken(&self, candidate: &Appointment) -> bool {
        self.appointments.values().any(|stored| {
            stored.user().id() == candidate.user().id()
                && stored.train_date_id() == candidate.train_date_id()
                && stored.child_label() == candidate.child_label()
        })
    }

    fn stats_rows<'a>(
        &'a self,
        filter: &'a StatsFilter,
        user_id: Option<&'a UserId>,
    ) -> impl Iterator<Item = (&'a Appointment, &'a TrainDate)> + 'a {
        self.appointments.values().filter_map(move |appointment| {
            if user_id.is_some_and(|id| !appointment.belongs_to(id)) {
                return None;
            }
            let slot = self.train_dates.get(appointment.train_date_id())?;
            filter.matches(slot).then_some((appointment, slot))
        })
    }
}

/// In-memory slots, appointments and statistics.
///
/// # Examples
/// ```
/// use booking::outbound::memory::InMemoryBookingStore;
///
/// let store = InMemoryBookingStore::new();
/// store.fail_next("save_many_appointments", 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBookingStore {
    state: Mutex<StoreState>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `times` calls of `operation` fail with an internal error.
    ///
    /// `operation` is the repository method name, e.g. `deduct_capacity`.
    pub fn fail_next(&self, operation: &str, times: usize) {
        if times == 0 {
            return;
        }
        if let Ok(mut state) = self.state.lock() {
            state.failures.insert(operation.to_owned(), times);
        }
    }

    /// Snapshot of a stored slot regardless of status.
    pub fn train_date(&self, id: &str) -> Option<TrainDate> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.train_dates.get(id).cloned())
    }

    /// Snapshot of every stored appointment, ordered by id.
    pub fn appointments(&self) -> Vec<Appointment> {
        self.state
            .lock()
            .map(|state| state.appointments.values().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self, operation: &str) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| RepositoryError::internal(operation, "store mutex poisoned"))?;
        state.take_failure(operation)?;
        Ok(state)
    }
}

fn insert_slots(
    state: &mut StoreState,
    operation: &str,
    train_dates: &[TrainDate],
) -> Result<(), RepositoryError> {
    let mut batch = HashSet::new();
    for slot in train_dates {
        if state.train_dates.contains_key(slot.id()) || !batch.insert(slot.id()) {
            return Err(RepositoryError::conflict(
                operation,
                format!("train date {} already exists", slot.id()),
            ));
        }
    }
    for slot in train_dates {
        state.train_dates.insert(slot.id().to_owned(), slot.clone());
    }
    Ok(())
}

fn replace_slots(
    state: &mut StoreState,
    operation: &str,
    train_dates: &[TrainDate],
) -> Result<(), RepositoryError> {
    if let Some(missing) = train_dates
        .iter()
        .find(|slot| !state.train_dates.contains_key(slot.id()))
    {
        return Err(RepositoryError::not_found(operation, missing.id()));
    }
    for slot in train_dates {
        state.train_dates.insert(slot.id().to_owned(), slot.clone());
    }
    Ok(())
}

fn insert_appointments(
    state: &mut StoreState,
    operation: &str,
    appointments: &[Appointment],
) -> Result<(), RepositoryError> {
    let mut ids = HashSet::new();
    let mut seats = HashSet::new();
    for appointment in appointments {
        let seat = (
            appointment.user().id().as_str(),
            appointment.train_date_id(),
            appointment.child_label(),
        );
        if state.appointments.contains_key(appointment.id())
            || state.seat_taken(appointment)
            || !ids.insert(appointment.id())
            || !seats.insert(seat)
        {
            return Err(RepositoryError::conflict(
                operation,
                format!(
                    "appointment for {} on {} already exists",
                    appointment.child_label(),
                    appointment.train_date_id()
                ),
            ));
        }
    }
    for appointment in appointments {
        state
            .appointments
            .insert(appointment.id().to_owned(), appointment.clone());
    }
    Ok(())
}

fn replace_appointments(
    state: &mut StoreState,
    operation: &str,
    appointments: &[Appointment],
) -> Result<(), RepositoryError> {
    if let Some(missing) = appointments
        .iter()
        .find(|appointment| !state.appointments.contains_key(appointment.id()))
    {
        return Err(RepositoryError::not_found(operation, missing.id()));
    }
    for appointment in appointments {
        state
            .appointments
            .insert(appointment.id().to_owned(), appointment.clone());
    }
    Ok(())
}

#[async_trait]
impl TrainRepository for InMemoryBookingStore {
    async fn save_train_date(&self, train_date: &TrainDate) -> Result<(), RepositoryError> {
        let mut state = self.lock("save_train_date")?;
        insert_slots(&mut state, "save_train_date", std::slice::from_ref(train_date))
    }

    async fn save_many_train_dates(
        &self,
        train_dates: &[TrainDate],
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock("save_many_train_dates")?;
        insert_slots(&mut state, "save_many_train_dates", train_dates)
    }

    async fn update_many_train_dates(
        &self,
        train_dates: &[TrainDate],
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock("update_many_train_dates")?;
        replace_slots(&mut state, "update_many_train_dates", train_dates)
    }

    async fn delete_train_date(&self, train_date: &TrainDate) -> Result<(), RepositoryError> {
        let mut state = self.lock("delete_train_date")?;
        let stored = state
            .train_dates
            .get_mut(train_date.id())
            .ok_or_else(|| RepositoryError::not_found("delete_train_date", train_date.id()))?;
        stored
            .delete(train_date.updated_at())
            .map_err(|err| RepositoryError::conflict("delete_train_date", err.to_string()))
    }

    async fn find_train_date_by_id(&self, id: &str) -> Result<Option<TrainDate>, RepositoryError> {
        let state = self.lock("find_train_date_by_id")?;
        Ok(state.train_dates.get(id).cloned())
    }

    async fn find_train_dates(
        &self,
        filter: &TrainDateFilter,
    ) -> Result<Vec<TrainDate>, RepositoryError> {
        let state = self.lock("find_train_dates")?;
        Ok(state.active_slots(filter).cloned().collect())
    }

    async fn query_train_dates_with_appointments(
        &self,
        filter: &TrainDateFilter,
    ) -> Result<Vec<TrainDateWithAppointments>, RepositoryError> {
        let state = self.lock("query_train_dates_with_appointments")?;
        Ok(state
            .active_slots(filter)
            .map(|slot| {
                TrainDateWithAppointments::from_parts(slot, state.appointments_for(slot.id()))
            })
            .collect())
    }

    async fn user_query_train_dates(
        &self,
        user_id: &UserId,
        filter: &TrainDateFilter,
    ) -> Result<Vec<UserTrainDateView>, RepositoryError> {
        let state = self.lock("user_query_train_dates")?;
        Ok(state
            .active_slots(filter)
            .map(|slot| {
                UserTrainDateView::from_parts(
                    user_id.as_str(),
                    slot,
                    state.appointments_for(slot.id()),
                )
            })
            .collect())
    }

    async fn check_overlap(
        &self,
        coach_id: &UserId,
        period: &TimeRange,
    ) -> Result<bool, RepositoryError> {
        let state = self.lock("check_overlap")?;
        Ok(state.coach_overlaps(coach_id, period))
    }

    async fn has_any_overlap(
        &self,
        coach_id: &UserId,
        periods: &[TimeRange],
    ) -> Result<bool, RepositoryError> {
        let state = self.lock("has_any_overlap")?;
        Ok(periods
            .iter()
            .any(|period| state.coach_overlaps(coach_id, period)))
    }

    async fn deduct_capacity(&self, id: &str, count: u32) -> Result<(), RepositoryError> {
        let mut state = self.lock("deduct_capacity")?;
        let slot = state
            .train_dates
            .get_mut(id)
            .filter(|slot| slot.status() == TrainDateStatus::Active)
            .ok_or_else(|| RepositoryError::not_found("deduct_capacity", id))?;
        if slot.available_capacity() < count {
            return Err(RepositoryError::capacity_not_enough(
                "deduct_capacity",
                format!(
                    "train date {id} has {} seats left, {count} requested",
                    slot.available_capacity()
                ),
            ));
        }
        slot.sync_available_capacity(slot.available_capacity() - count);
        Ok(())
    }

    async fn increase_capacity(&self, id: &str, count: u32) -> Result<(), RepositoryError> {
        let mut state = self.lock("increase_capacity")?;
        let slot = state
            .train_dates
            .get_mut(id)
            .ok_or_else(|| RepositoryError::not_found("increase_capacity", id))?;
        let raised = slot.available_capacity().saturating_add(count);
        slot.sync_available_capacity(raised);
        Ok(())
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryBookingStore {
    async fn save_appointment(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        let mut state = self.lock("save_appointment")?;
        insert_appointments(
            &mut state,
            "save_appointment",
            std::slice::from_ref(appointment),
        )
    }

    async fn save_many_appointments(
        &self,
        appointments: &[Appointment],
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock("save_many_appointments")?;
        insert_appointments(&mut state, "save_many_appointments", appointments)
    }

    async fn delete_appointment(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        let mut state = self.lock("delete_appointment")?;
        if appointment.status() != AppointmentStatus::Cancelled {
            return Err(RepositoryError::conflict(
                "delete_appointment",
                format!(
                    "appointment {} is {} and cannot be deleted",
                    appointment.id(),
                    appointment.status()
                ),
            ));
        }
        state
            .appointments
            .remove(appointment.id())
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found("delete_appointment", appointment.id()))
    }

    async fn update_appointment(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        let mut state = self.lock("update_appointment")?;
        replace_appointments(
            &mut state,
            "update_appointment",
            std::slice::from_ref(appointment),
        )
    }

    async fn update_many_appointments(
        &self,
        appointments: &[Appointment],
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock("update_many_appointments")?;
        replace_appointments(&mut state, "update_many_appointments", appointments)
    }

    async fn find_appointment_by_id(
        &self,
        id: &str,
    ) -> Result<Option<Appointment>, RepositoryError> {
        let state = self.lock("find_appointment_by_id")?;
        Ok(state.appointments.get(id).cloned())
    }

    async fn find_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        let state = self.lock("find_appointments")?;
        let mut found: Vec<_> = state
            .appointments
            .values()
            .filter(|appointment| filter.matches(appointment))
            .cloned()
            .collect();
        found.sort_by(|left, right| {
            left.created_at()
                .cmp(&right.created_at())
                .then_with(|| left.id().cmp(right.id()))
        });
        Ok(found)
    }

    async fn page_find_with_train_date(
        &self,
        appointment_filter: &AppointmentFilter,
        train_date_filter: &TrainDateFilter,
        cursor: &str,
    ) -> Result<Page<AppointmentWithTrainDate>, RepositoryError> {
        const OPERATION: &str = "page_find_with_train_date";
        let cursor = decode_appointment_cursor(OPERATION, cursor)?;
        let state = self.lock(OPERATION)?;

        let mut rows: Vec<_> = state
            .appointments
            .values()
            .filter(|appointment| appointment_filter.matches(appointment))
            .filter_map(|appointment| {
                let slot = state.train_dates.get(appointment.train_date_id())?;
                let key = AppointmentPageKey::new(slot.period().start(), appointment.id());
                let after_cursor = cursor.key().is_none_or(|last| key > *last);
                (train_date_filter.matches(slot) && after_cursor)
                    .then(|| (key, AppointmentWithTrainDate::from_parts(appointment, slot)))
            })
            .collect();
        rows.sort_by(|(left, _), (right, _)| left.cmp(right));

        let items: Vec<_> = rows
            .into_iter()
            .take(cursor.page_size().as_usize())
            .map(|(_, row)| row)
            .collect();
        Page::assemble(items, cursor.page_size(), |last| {
            AppointmentPageKey::new(last.train_date.start, last.id.clone())
        })
        .map_err(|err| RepositoryError::internal(OPERATION, err.to_string()))
    }
}

#[async_trait]
impl StatsRepository for InMemoryBookingStore {
    async fn all_user_stats(
        &self,
        filter: &StatsFilter,
    ) -> Result<Vec<UserApptStats>, RepositoryError> {
        let state = self.lock("all_user_stats")?;
        Ok(UserApptStats::aggregate(state.stats_rows(filter, None)))
    }

    async fn user_stats(
        &self,
        user_id: &UserId,
        filter: &StatsFilter,
    ) -> Result<Option<UserApptStats>, RepositoryError> {
        let state = self.lock("user_stats")?;
        Ok(UserApptStats::aggregate(state.stats_rows(filter, Some(user_id)))
            .into_iter()
            .next())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use chrono::Duration;
    use pagination::{Cursor, PageSize};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::ports::RepositoryErrorKind;
    use crate::test_support::{appointment, at, parent, train_date, train_date_with_capacity};

    #[fixture]
    fn store() -> InMemoryBookingStore {
        InMemoryBookingStore::new()
    }

    fn first_page(size: u32) -> String {
        Cursor::<AppointmentPageKey>::first(PageSize::try_new(size).expect("valid size"))
            .encode()
            .expect("cursor encodes")
    }

    #[rstest]
    #[tokio::test]
    async fn deduct_fails_instead_of_going_negative(store: InMemoryBookingStore) {
        let slot = train_date_with_capacity("td-1", at(12), 2, at(6));
        store.save_train_date(&slot).await.expect("slot saved");

        store.deduct_capacity("td-1", 2).await.expect("two seats");
        let err = store
            .deduct_capacity("td-1", 1)
            .await
            .expect_err("no seats left");

        assert_eq!(err.kind(), RepositoryErrorKind::CapacityNotEnough);
        assert_eq!(
            store.train_date("td-1").map(|s| s.available_capacity()),
            Some(0)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn increase_clamps_at_max_capacity(store: InMemoryBookingStore) {
        let slot = train_date_with_capacity("td-1", at(12), 3, at(6));
        store.save_train_date(&slot).await.expect("slot saved");
        store.deduct_capacity("td-1", 1).await.expect("deducted");

        store.increase_capacity("td-1", 5).await.expect("increased");

        assert_eq!(
            store.train_date("td-1").map(|s| s.available_capacity()),
            Some(3)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_slot_capacity_is_not_found(store: InMemoryBookingStore) {
        let err = store
            .deduct_capacity("missing", 1)
            .await
            .expect_err("unknown slot");
        assert_eq!(err.kind(), RepositoryErrorKind::NotFound);
        assert_eq!(err.operation(), "deduct_capacity");
    }

    #[rstest]
    #[tokio::test]
    async fn retiring_checks_the_stored_seat_count(store: InMemoryBookingStore) {
        let slot = train_date_with_capacity("td-1", at(12), 3, at(6));
        store.save_train_date(&slot).await.expect("slot saved");
        let mut snapshot = store
            .find_train_date_by_id("td-1")
            .await
            .expect("lookup")
            .expect("slot stored");
        store.deduct_capacity("td-1", 1).await.expect("booked");

        snapshot.delete(at(7)).expect("snapshot still looks empty");
        let err = store
            .delete_train_date(&snapshot)
            .await
            .expect_err("a seat is held");

        assert_eq!(err.kind(), RepositoryErrorKind::Conflict);
        let stored = store.train_date("td-1").expect("slot stored");
        assert_eq!(stored.status(), TrainDateStatus::Active);
        assert_eq!(stored.available_capacity(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn retired_slot_takes_no_bookings(store: InMemoryBookingStore) {
        let mut slot = train_date_with_capacity("td-1", at(12), 3, at(6));
        store.save_train_date(&slot).await.expect("slot saved");
        slot.delete(at(7)).expect("empty slot");
        store.delete_train_date(&slot).await.expect("retired");

        let err = store
            .deduct_capacity("td-1", 1)
            .await
            .expect_err("inactive slot");

        assert_eq!(err.kind(), RepositoryErrorKind::NotFound);
        let stored = store.train_date("td-1").expect("slot stored");
        assert_eq!(stored.status(), TrainDateStatus::Inactive);
        assert_eq!(stored.available_capacity(), 3);
    }

    #[rstest]
    #[tokio::test]
    async fn injected_failures_are_one_shot(store: InMemoryBookingStore) {
        store.fail_next("find_train_date_by_id", 1);

        let err = store
            .find_train_date_by_id("td-1")
            .await
            .expect_err("injected");
        assert!(err.is_retryable());
        assert!(store.find_train_date_by_id("td-1").await.is_ok());
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_seat_is_a_conflict(store: InMemoryBookingStore) {
        let user = parent("u1");
        let first = appointment("a1", "td-1", &user, "Mia", at(6));
        let again = appointment("a2", "td-1", &user, "Mia", at(7));
        store.save_appointment(&first).await.expect("saved");

        let err = store
            .save_many_appointments(&[again])
            .await
            .expect_err("seat already booked");

        assert_eq!(err.kind(), RepositoryErrorKind::Conflict);
        assert_eq!(store.appointments().len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn delete_requires_cancelled_status(store: InMemoryBookingStore) {
        let user = parent("u1");
        let mut booked = appointment("a1", "td-1", &user, "Mia", at(6));
        store.save_appointment(&booked).await.expect("saved");

        let err = store
            .delete_appointment(&booked)
            .await
            .expect_err("still confirmed");
        assert_eq!(err.kind(), RepositoryErrorKind::Conflict);

        booked
            .cancel_as_mistake(user.id(), at(7))
            .expect("within grace period");
        store.delete_appointment(&booked).await.expect("deleted");
        assert!(store.appointments().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn overlap_is_scoped_to_active_slots_of_one_coach(store: InMemoryBookingStore) {
        let slot = train_date("td-1", at(12), at(6));
        store.save_train_date(&slot).await.expect("saved");
        let coach = slot.coach_id().clone();
        let other = UserId::new("coach-2").expect("valid id");
        let clash = TimeRange::new(at(12) + Duration::minutes(30), at(14)).expect("valid");
        let touching = TimeRange::new(at(13), at(14)).expect("valid");

        assert!(store.check_overlap(&coach, &clash).await.expect("query"));
        assert!(!store.check_overlap(&coach, &touching).await.expect("query"));
        assert!(!store.check_overlap(&other, &clash).await.expect("query"));
        assert!(
            store
                .has_any_overlap(&coach, &[touching, clash])
                .await
                .expect("query")
        );
    }

    #[rstest]
    #[tokio::test]
    async fn pages_follow_slot_start_then_id(store: InMemoryBookingStore) {
        let user = parent("u1");
        for (id, hour) in [("td-a", 14), ("td-b", 12)] {
            store
                .save_train_date(&train_date(id, at(hour), at(6)))
                .await
                .expect("saved");
        }
        let booked = [
            appointment("a3", "td-a", &user, "Mia", at(6)),
            appointment("a2", "td-b", &user, "Noah", at(6)),
            appointment("a1", "td-b", &user, "Mia", at(6)),
        ];
        store.save_many_appointments(&booked).await.expect("saved");

        let by_user = AppointmentFilter::ByUser(user.id().clone());
        let upcoming = TrainDateFilter::StartsFrom(at(6));
        let first = store
            .page_find_with_train_date(&by_user, &upcoming, &first_page(2))
            .await
            .expect("first page");
        let ids: Vec<_> = first.items().iter().map(|row| row.id.as_str()).collect();
        assert_eq!(ids, ["a1", "a2"]);

        let token = first.next_cursor().expect("more rows").to_owned();
        let second = store
            .page_find_with_train_date(&by_user, &upcoming, &token)
            .await
            .expect("second page");
        let ids: Vec<_> = second.items().iter().map(|row| row.id.as_str()).collect();
        assert_eq!(ids, ["a3"]);
        assert!(second.is_last());
    }

    #[rstest]
    #[tokio::test]
    async fn garbage_cursor_is_rejected(store: InMemoryBookingStore) {
        let err = store
            .page_find_with_train_date(
                &AppointmentFilter::ByIds(vec![]),
                &TrainDateFilter::StartsFrom(at(0)),
                "%%%",
            )
            .await
            .expect_err("bad cursor");
        assert_eq!(err.kind(), RepositoryErrorKind::InvalidCursor);
    }

    #[rstest]
    #[tokio::test]
    async fn user_stats_cover_only_the_requested_window(store: InMemoryBookingStore) {
        let user = parent("u1");
        let inside = train_date("td-in", at(12), at(6));
        let outside = train_date("td-out", at(12) + Duration::days(40), at(6));
        store
            .save_many_train_dates(&[inside, outside])
            .await
            .expect("saved");
        store
            .save_many_appointments(&[
                appointment("a1", "td-in", &user, "Mia", at(6)),
                appointment("a2", "td-out", &user, "Mia", at(6)),
            ])
            .await
            .expect("saved");

        let window = TimeRange::new(at(0), at(0) + Duration::days(7)).expect("valid");
        let stats = store
            .user_stats(user.id(), &StatsFilter::TrainTimeRange(window))
            .await
            .expect("query")
            .expect("user has rows");

        assert_eq!(stats.total_appointments, 1);
        assert!(
            store
                .user_stats(
                    &UserId::new("nobody").expect("valid"),
                    &StatsFilter::TrainTimeRange(window)
                )
                .await
                .expect("query")
                .is_none()
        );
    }
}
