//! PostgreSQL-backed `AppointmentRepository` implementation using Diesel ORM.
//!
//! The seat uniqueness key is enforced by the `appointments_seat_key` index;
//! a violation surfaces as `Conflict`. Bulk writes run in one transaction.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use pagination::Page;

use crate::domain::ports::{
    AppointmentFilter, AppointmentPageKey, AppointmentRepository, RepositoryError,
    TrainDateFilter, decode_appointment_cursor,
};
use crate::domain::{Appointment, AppointmentStatus, AppointmentWithTrainDate};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{AppointmentChangeset, AppointmentRow, NewAppointmentRecord, TrainDateRow};
use super::pool::DbPool;
use super::schema::{appointments, train_dates};

/// Diesel-backed implementation of the appointment repository port.
#[derive(Clone)]
pub struct DieselAppointmentRepository {
    pool: DbPool,
}

impl DieselAppointmentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn insert(
        &self,
        operation: &str,
        appointments: &[Appointment],
    ) -> Result<(), RepositoryError> {
        if appointments.is_empty() {
            return Ok(());
        }
        let records: Vec<_> = appointments
            .iter()
            .map(NewAppointmentRecord::from_domain)
            .collect();
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(operation, err))?;

        diesel::insert_into(appointments::table)
            .values(&records)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_diesel_error(operation, err))
    }

    async fn update(
        &self,
        operation: &str,
        seats: &[Appointment],
    ) -> Result<(), RepositoryError> {
        let changes: Vec<_> = seats
            .iter()
            .map(|seat| (seat.id(), AppointmentChangeset::from_domain(seat)))
            .collect();
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(operation, err))?;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                for (id, changeset) in &changes {
                    let updated = diesel::update(appointments::table.find(*id))
                        .set(changeset)
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
        .map_err(|err| map_diesel_error(operation, err))
    }
}

#[async_trait]
impl AppointmentRepository for DieselAppointmentRepository {
    async fn save_appointment(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        self.insert("save_appointment", std::slice::from_ref(appointment))
            .await
    }

    async fn save_many_appointments(
        &self,
        seats: &[Appointment],
    ) -> Result<(), RepositoryError> {
        self.insert("save_many_appointments", seats).await
    }

    async fn delete_appointment(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        const OPERATION: &str = "delete_appointment";
        if appointment.status() != AppointmentStatus::Cancelled {
            return Err(RepositoryError::conflict(
                OPERATION,
                format!(
                    "appointment {} is {} and cannot be deleted",
                    appointment.id(),
                    appointment.status()
                ),
            ));
        }
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(OPERATION, err))?;

        let deleted = diesel::delete(appointments::table.find(appointment.id()))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(OPERATION, err))?;
        if deleted == 0 {
            return Err(RepositoryError::not_found(OPERATION, appointment.id()));
        }
        Ok(())
    }

    async fn update_appointment(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        self.update("update_appointment", std::slice::from_ref(appointment))
            .await
    }

    async fn update_many_appointments(
        &self,
        seats: &[Appointment],
    ) -> Result<(), RepositoryError> {
        self.update("update_many_appointments", seats).await
    }

    async fn find_appointment_by_id(
        &self,
        id: &str,
    ) -> Result<Option<Appointment>, RepositoryError> {
        const OPERATION: &str = "find_appointment_by_id";
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(OPERATION, err))?;

        let row = appointments::table
            .find(id)
            .select(AppointmentRow::as_select())
            .first::<AppointmentRow>(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(OPERATION, err))?;

        row.map(|row| row.into_domain(OPERATION)).transpose()
    }

    async fn find_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        const OPERATION: &str = "find_appointments";
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(OPERATION, err))?;

        let query = appointments::table
            .select(AppointmentRow::as_select())
            .order((appointments::created_at.asc(), appointments::id.asc()))
            .into_boxed();
        let query = match filter {
            AppointmentFilter::ByTrainDate(id) => {
                query.filter(appointments::train_date_id.eq(id.clone()))
            }
            AppointmentFilter::ByIds(ids) => query.filter(appointments::id.eq_any(ids.clone())),
            AppointmentFilter::ByUser(user_id) => {
                query.filter(appointments::user_id.eq(user_id.as_str().to_owned()))
            }
        };

        let rows: Vec<AppointmentRow> = query
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(OPERATION, err))?;
        rows.into_iter()
            .map(|row| row.into_domain(OPERATION))
            .collect()
    }

    async fn page_find_with_train_date(
        &self,
        appointment_filter: &AppointmentFilter,
        train_date_filter: &TrainDateFilter,
        cursor: &str,
    ) -> Result<Page<AppointmentWithTrainDate>, RepositoryError> {
        const OPERATION: &str = "page_find_with_train_date";
        let cursor = decode_appointment_cursor(OPERATION, cursor)?;
        let page_size = cursor.page_size();

        let query = appointments::table
            .inner_join(train_dates::table)
            .select((AppointmentRow::as_select(), TrainDateRow::as_select()))
            .order((train_dates::start_time.asc(), appointments::id.asc()))
            .limit(i64::from(page_size.get()))
            .into_boxed();
        let query = match appointment_filter {
            AppointmentFilter::ByTrainDate(id) => {
                query.filter(appointments::train_date_id.eq(id.clone()))
            }
            AppointmentFilter::ByIds(ids) => query.filter(appointments::id.eq_any(ids.clone())),
            AppointmentFilter::ByUser(user_id) => {
                query.filter(appointments::user_id.eq(user_id.as_str().to_owned()))
            }
        };
        let query = match train_date_filter {
            TrainDateFilter::Ids(ids) => query.filter(train_dates::id.eq_any(ids.clone())),
            TrainDateFilter::StartsFrom(instant) => {
                query.filter(train_dates::start_time.ge(*instant))
            }
            TrainDateFilter::Within(window) => query
                .filter(train_dates::start_time.ge(window.start()))
                .filter(train_dates::end_time.le(window.end())),
            TrainDateFilter::EndsAfter(instant) => query.filter(train_dates::end_time.gt(*instant)),
        };
        let query = match cursor.key() {
            Some(last) => query.filter(
                train_dates::start_time.gt(last.start).or(train_dates::start_time
                    .eq(last.start)
                    .and(appointments::id.gt(last.id.clone()))),
            ),
            None => query,
        };

        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(OPERATION, err))?;
        let rows: Vec<(AppointmentRow, TrainDateRow)> = query
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(OPERATION, err))?;

        let items = rows
            .into_iter()
            .map(|(seat, slot)| {
                let seat = seat.into_domain(OPERATION)?;
                let slot = slot.into_domain(OPERATION)?;
                Ok(AppointmentWithTrainDate::from_parts(&seat, &slot))
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;
        Page::assemble(items, page_size, |last| {
            AppointmentPageKey::new(last.train_date.start, last.id.clone())
        })
        .map_err(|err| RepositoryError::internal(OPERATION, err.to_string()))
    }
}
