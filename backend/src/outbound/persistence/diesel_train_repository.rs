//! PostgreSQL-backed `TrainRepository` implementation using Diesel ORM.
//!
//! Seat counting happens in SQL: deduction is one conditional `UPDATE` that
//! touches no row when too few seats remain, and release is one clamped
//! `UPDATE`. Neither holds a lock across round trips.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Bool, Text};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{RepositoryError, TrainDateFilter, TrainRepository};
use crate::domain::{
    Appointment, TimeRange, TrainDate, TrainDateStatus, TrainDateWithAppointments, UserId,
    UserTrainDateView,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{AppointmentRow, TrainDateRecord, TrainDateRow};
use super::pool::DbPool;
use super::schema::{appointments, train_dates};

type SlotPredicate = Box<dyn BoxableExpression<train_dates::table, Pg, SqlType = Bool>>;

/// Diesel-backed implementation of the slot repository port.
#[derive(Clone)]
pub struct DieselTrainRepository {
    pool: DbPool,
}

impl DieselTrainRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_slots(
        &self,
        operation: &str,
        filter: &TrainDateFilter,
    ) -> Result<Vec<TrainDate>, RepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(operation, err))?;

        let rows: Vec<TrainDateRow> = train_dates::table
            .filter(train_dates::status.eq(TrainDateStatus::Active.as_str()))
            .filter(slot_predicate(filter))
            .order((train_dates::start_time.asc(), train_dates::id.asc()))
            .select(TrainDateRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(operation, err))?;

        rows.into_iter()
            .map(|row| row.into_domain(operation))
            .collect()
    }

    /// Load the slots matching `filter` together with their appointments,
    /// grouped by slot id and ordered by booking time.
    async fn load_slots_with_seats(
        &self,
        operation: &str,
        filter: &TrainDateFilter,
    ) -> Result<(Vec<TrainDate>, HashMap<String, Vec<Appointment>>), RepositoryError> {
        let slots = self.load_slots(operation, filter).await?;
        if slots.is_empty() {
            return Ok((slots, HashMap::new()));
        }

        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(operation, err))?;
        let ids: Vec<&str> = slots.iter().map(TrainDate::id).collect();
        let rows: Vec<AppointmentRow> = appointments::table
            .filter(appointments::train_date_id.eq_any(ids))
            .order((appointments::created_at.asc(), appointments::id.asc()))
            .select(AppointmentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(operation, err))?;

        let mut seats: HashMap<String, Vec<Appointment>> = HashMap::new();
        for row in rows {
            let appointment = row.into_domain(operation)?;
            seats
                .entry(appointment.train_date_id().to_owned())
                .or_default()
                .push(appointment);
        }
        Ok((slots, seats))
    }

    async fn overlap_exists(
        &self,
        operation: &str,
        coach_id: &UserId,
        periods: &[TimeRange],
    ) -> Result<bool, RepositoryError> {
        let Some(any_period) = periods
            .iter()
            .map(overlaps)
            .reduce(|acc, next| Box::new(acc.or(next)))
        else {
            return Ok(false);
        };
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(operation, err))?;

        diesel::select(exists(
            train_dates::table
                .filter(train_dates::coach_id.eq(coach_id.as_str()))
                .filter(train_dates::status.eq(TrainDateStatus::Active.as_str()))
                .filter(any_period),
        ))
        .get_result::<bool>(&mut conn)
        .await
        .map_err(|err| map_diesel_error(operation, err))
    }

    async fn insert(&self, operation: &str, slots: &[TrainDate]) -> Result<(), RepositoryError> {
        if slots.is_empty() {
            return Ok(());
        }
        let records = slots
            .iter()
            .map(|slot| TrainDateRecord::from_domain(operation, slot))
            .collect::<Result<Vec<_>, _>>()?;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(operation, err))?;

        diesel::insert_into(train_dates::table)
            .values(&records)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_diesel_error(operation, err))
    }
}

fn slot_predicate(filter: &TrainDateFilter) -> SlotPredicate {
    match filter {
        TrainDateFilter::Ids(ids) => Box::new(train_dates::id.eq_any(ids.clone())),
        TrainDateFilter::StartsFrom(instant) => Box::new(train_dates::start_time.ge(*instant)),
        TrainDateFilter::Within(window) => Box::new(
            train_dates::start_time
                .ge(window.start())
                .and(train_dates::end_time.le(window.end())),
        ),
        TrainDateFilter::EndsAfter(instant) => Box::new(train_dates::end_time.gt(*instant)),
    }
}

/// Half-open interval intersection against a stored period.
fn overlaps(period: &TimeRange) -> SlotPredicate {
    Box::new(
        train_dates::start_time
            .lt(period.end())
            .and(train_dates::end_time.gt(period.start())),
    )
}

/// Active slot `id` with at least `delta` free seats.
fn bookable(id: &str, delta: i32) -> SlotPredicate {
    Box::new(
        train_dates::id
            .eq(id.to_owned())
            .and(train_dates::status.eq(TrainDateStatus::Active.as_str()))
            .and(train_dates::available_capacity.ge(delta)),
    )
}

/// Slot `id` with every seat free.
fn retirable(id: &str) -> SlotPredicate {
    Box::new(
        train_dates::id
            .eq(id.to_owned())
            .and(train_dates::available_capacity.eq(train_dates::max_capacity)),
    )
}

/// Seat counts beyond the column range can never be satisfied.
fn seat_delta(operation: &str, id: &str, count: u32) -> Result<i32, RepositoryError> {
    i32::try_from(count).map_err(|_| {
        RepositoryError::capacity_not_enough(
            operation,
            format!("train date {id} cannot hold {count} seats"),
        )
    })
}

#[async_trait]
impl TrainRepository for DieselTrainRepository {
    async fn save_train_date(&self, train_date: &TrainDate) -> Result<(), RepositoryError> {
        self.insert("save_train_date", std::slice::from_ref(train_date))
            .await
    }

    async fn save_many_train_dates(
        &self,
        slots: &[TrainDate],
    ) -> Result<(), RepositoryError> {
        self.insert("save_many_train_dates", slots).await
    }

    async fn update_many_train_dates(
        &self,
        slots: &[TrainDate],
    ) -> Result<(), RepositoryError> {
        const OPERATION: &str = "update_many_train_dates";
        let records = slots
            .iter()
            .map(|slot| TrainDateRecord::from_domain(OPERATION, slot))
            .collect::<Result<Vec<_>, _>>()?;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(OPERATION, err))?;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                for record in &records {
                    let updated = diesel::update(train_dates::table.find(record.id))
                        .set(record)
                        .execute(conn)
                        .await?;
                    if updated == 0 {
                        return Err(diesel::result::Error::NotFound);
                    }
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_diesel_error(OPERATION, err))
    }

    async fn delete_train_date(&self, train_date: &TrainDate) -> Result<(), RepositoryError> {
        const OPERATION: &str = "delete_train_date";
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(OPERATION, err))?;

        let updated = diesel::update(train_dates::table.filter(retirable(train_date.id())))
            .set((
                train_dates::status.eq(TrainDateStatus::Inactive.as_str()),
                train_dates::updated_at.eq(train_date.updated_at()),
            ))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(OPERATION, err))?;
        if updated == 1 {
            return Ok(());
        }

        let known = diesel::select(exists(train_dates::table.find(train_date.id())))
            .get_result::<bool>(&mut conn)
            .await
            .map_err(|err| map_diesel_error(OPERATION, err))?;
        if known {
            Err(RepositoryError::conflict(
                OPERATION,
                format!("train date {} still has booked seats", train_date.id()),
            ))
        } else {
            Err(RepositoryError::not_found(OPERATION, train_date.id()))
        }
    }

    async fn find_train_date_by_id(&self, id: &str) -> Result<Option<TrainDate>, RepositoryError> {
        const OPERATION: &str = "find_train_date_by_id";
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(OPERATION, err))?;

        let row = train_dates::table
            .find(id)
            .select(TrainDateRow::as_select())
            .first::<TrainDateRow>(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(OPERATION, err))?;

        row.map(|row| row.into_domain(OPERATION)).transpose()
    }

    async fn find_train_dates(
        &self,
        filter: &TrainDateFilter,
    ) -> Result<Vec<TrainDate>, RepositoryError> {
        self.load_slots("find_train_dates", filter).await
    }

    async fn query_train_dates_with_appointments(
        &self,
        filter: &TrainDateFilter,
    ) -> Result<Vec<TrainDateWithAppointments>, RepositoryError> {
        let (slots, seats) = self
            .load_slots_with_seats("query_train_dates_with_appointments", filter)
            .await?;
        Ok(slots
            .iter()
            .map(|slot| {
                TrainDateWithAppointments::from_parts(
                    slot,
                    seats.get(slot.id()).into_iter().flatten(),
                )
            })
            .collect())
    }

    async fn user_query_train_dates(
        &self,
        user_id: &UserId,
        filter: &TrainDateFilter,
    ) -> Result<Vec<UserTrainDateView>, RepositoryError> {
        let (slots, seats) = self
            .load_slots_with_seats("user_query_train_dates", filter)
            .await?;
        Ok(slots
            .iter()
            .map(|slot| {
                UserTrainDateView::from_parts(
                    user_id.as_str(),
                    slot,
                    seats.get(slot.id()).into_iter().flatten(),
                )
            })
            .collect())
    }

    async fn check_overlap(
        &self,
        coach_id: &UserId,
        period: &TimeRange,
    ) -> Result<bool, RepositoryError> {
        self.overlap_exists("check_overlap", coach_id, std::slice::from_ref(period))
            .await
    }

    async fn has_any_overlap(
        &self,
        coach_id: &UserId,
        periods: &[TimeRange],
    ) -> Result<bool, RepositoryError> {
        self.overlap_exists("has_any_overlap", coach_id, periods)
            .await
    }

    async fn deduct_capacity(&self, id: &str, count: u32) -> Result<(), RepositoryError> {
        const OPERATION: &str = "deduct_capacity";
        let delta = seat_delta(OPERATION, id, count)?;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(OPERATION, err))?;

        let updated = diesel::update(train_dates::table.filter(bookable(id, delta)))
            .set(train_dates::available_capacity.eq(train_dates::available_capacity - delta))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(OPERATION, err))?;
        if updated == 1 {
            return Ok(());
        }

        let active = diesel::select(exists(
            train_dates::table
                .find(id)
                .filter(train_dates::status.eq(TrainDateStatus::Active.as_str())),
        ))
        .get_result::<bool>(&mut conn)
        .await
        .map_err(|err| map_diesel_error(OPERATION, err))?;
        if active {
            Err(RepositoryError::capacity_not_enough(
                OPERATION,
                format!("train date {id} has fewer than {count} seats left"),
            ))
        } else {
            Err(RepositoryError::not_found(OPERATION, id))
        }
    }

    async fn increase_capacity(&self, id: &str, count: u32) -> Result<(), RepositoryError> {
        const OPERATION: &str = "increase_capacity";
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(OPERATION, err))?;

        let updated = diesel::sql_query(
            "UPDATE train_dates \
             SET available_capacity = LEAST(max_capacity::BIGINT, available_capacity::BIGINT + $1) \
             WHERE id = $2",
        )
        .bind::<BigInt, _>(i64::from(count))
        .bind::<Text, _>(id)
        .execute(&mut conn)
        .await
        .map_err(|err| map_diesel_error(OPERATION, err))?;
        if updated == 0 {
            return Err(RepositoryError::not_found(OPERATION, id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for query construction.

    use diesel::debug_query;
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::RepositoryErrorKind;
    use crate::test_support::{at, period};

    fn render(predicate: SlotPredicate) -> String {
        debug_query::<Pg, _>(&train_dates::table.filter(predicate)).to_string()
    }

    #[rstest]
    fn within_filter_bounds_both_ends() {
        let window = TimeRange::new(at(0), at(23)).expect("valid window");
        let sql = render(slot_predicate(&TrainDateFilter::Within(window)));

        assert!(sql.contains(r#""train_dates"."start_time" >= $1"#));
        assert!(sql.contains(r#""train_dates"."end_time" <= $2"#));
    }

    #[rstest]
    fn overlap_uses_half_open_comparison() {
        let sql = render(overlaps(&period(at(10), 60)));

        assert!(sql.contains(r#""train_dates"."start_time" < $1"#));
        assert!(sql.contains(r#""train_dates"."end_time" > $2"#));
    }

    #[rstest]
    fn oversized_seat_counts_are_not_retryable() {
        let err = seat_delta("deduct_capacity", "td-1", u32::MAX).expect_err("overflows i32");

        assert_eq!(err.kind(), RepositoryErrorKind::CapacityNotEnough);
        assert!(!err.is_retryable());
    }

    #[rstest]
    fn deduction_targets_active_slots_with_enough_seats() {
        let sql = render(bookable("td-1", 2));

        assert!(sql.contains(r#""train_dates"."id" = $1"#));
        assert!(sql.contains(r#""train_dates"."status" = $2"#));
        assert!(sql.contains(r#""train_dates"."available_capacity" >= $3"#));
        assert!(sql.contains(r#"binds: ["td-1", "ACTIVE", 2]"#));
    }

    #[rstest]
    fn retirement_requires_every_seat_free() {
        let sql = render(retirable("td-1"));

        assert!(sql.contains(
            r#""train_dates"."available_capacity" = "train_dates"."max_capacity""#
        ));
    }
}
