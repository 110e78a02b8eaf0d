//! PostgreSQL-backed `StatsRepository` implementation.
//!
//! Loads the appointment and slot rows inside the window in one join and
//! folds them with [`UserApptStats::aggregate`], the same fold the in-memory
//! store uses.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{RepositoryError, StatsFilter, StatsRepository};
use crate::domain::{UserApptStats, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{AppointmentRow, TrainDateRow};
use super::pool::DbPool;
use super::schema::{appointments, train_dates};

/// Diesel-backed implementation of the statistics port.
#[derive(Clone)]
pub struct DieselStatsRepository {
    pool: DbPool,
}

impl DieselStatsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn aggregate(
        &self,
        operation: &str,
        filter: &StatsFilter,
        user_id: Option<&UserId>,
    ) -> Result<Vec<UserApptStats>, RepositoryError> {
        let StatsFilter::TrainTimeRange(window) = filter;
        let query = appointments::table
            .inner_join(train_dates::table)
            .filter(train_dates::start_time.ge(window.start()))
            .filter(train_dates::start_time.le(window.end()))
            .select((AppointmentRow::as_select(), TrainDateRow::as_select()))
            .into_boxed();
        let query = match user_id {
            Some(user_id) => query.filter(appointments::user_id.eq(user_id.as_str().to_owned())),
            None => query,
        };

        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(operation, err))?;
        let rows: Vec<(AppointmentRow, TrainDateRow)> = query
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(operation, err))?;

        let pairs = rows
            .into_iter()
            .map(|(seat, slot)| Ok((seat.into_domain(operation)?, slot.into_domain(operation)?)))
            .collect::<Result<Vec<_>, RepositoryError>>()?;
        Ok(UserApptStats::aggregate(
            pairs.iter().map(|(seat, slot)| (seat, slot)),
        ))
    }
}

#[async_trait]
impl StatsRepository for DieselStatsRepository {
    async fn all_user_stats(
        &self,
        filter: &StatsFilter,
    ) -> Result<Vec<UserApptStats>, RepositoryError> {
        self.aggregate("all_user_stats", filter, None).await
    }

    async fn user_stats(
        &self,
        user_id: &UserId,
        filter: &StatsFilter,
    ) -> Result<Option<UserApptStats>, RepositoryError> {
        Ok(self
            .aggregate("user_stats", filter, Some(user_id))
            .await?
            .into_iter()
            .next())
    }
}
