//! Slot listings for coaches and users.
//!
//! All listings contain active slots only, ordered by start time.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::UseCase;
use crate::domain::ports::{TrainDateFilter, TrainRepository};
use crate::domain::{
    Error, TimeRange, TrainDate, TrainDateWithAppointments, UserId, UserTrainDateView,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainsAfterRequest {
    pub after: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainRangeRequest {
    pub range: TimeRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainByIdRequest {
    pub train_date_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTrainsAfterRequest {
    pub user_id: UserId,
    pub after: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTrainByIdRequest {
    pub user_id: UserId,
    pub train_date_id: String,
}

fn first_or_not_found<T>(
    items: Vec<T>,
    use_case: &'static str,
    what: impl FnOnce() -> String,
) -> Result<T, Error> {
    items
        .into_iter()
        .next()
        .ok_or_else(|| Error::not_found(use_case, "TRAIN_DATE_NOT_FOUND", what()))
}

/// Admin listing of upcoming slots with their bookings.
pub struct QueryFutureTrain<T> {
    trains: Arc<T>,
}

impl<T> QueryFutureTrain<T> {
    pub fn new(trains: Arc<T>) -> Self {
        Self { trains }
    }
}

#[async_trait]
impl<T: TrainRepository> UseCase for QueryFutureTrain<T> {
    type Request = TrainsAfterRequest;
    type Response = Vec<TrainDateWithAppointments>;

    fn name(&self) -> &'static str {
        "QueryFutureTrain"
    }

    async fn execute(&self, request: Self::Request) -> Result<Self::Response, Error> {
        self.trains
            .query_train_dates_with_appointments(&TrainDateFilter::StartsFrom(request.after))
            .await
            .map_err(|err| Error::wrap(self.name(), "QUERY_TRAIN_DATES", err))
    }
}

/// Admin listing of slots inside a range with their bookings.
pub struct AdminQueryTrainRange<T> {
    trains: Arc<T>,
}

impl<T> AdminQueryTrainRange<T> {
    pub fn new(trains: Arc<T>) -> Self {
        Self { trains }
    }
}

#[async_trait]
impl<T: TrainRepository> UseCase for AdminQueryTrainRange<T> {
    type Request = TrainRangeRequest;
    type Response = Vec<TrainDateWithAppointments>;

    fn name(&self) -> &'static str {
        "AdminQueryTrainRange"
    }

    async fn execute(&self, request: Self::Request) -> Result<Self::Response, Error> {
        self.trains
            .query_train_dates_with_appointments(&TrainDateFilter::Within(request.range))
            .await
            .map_err(|err| Error::wrap(self.name(), "QUERY_TRAIN_DATES", err))
    }
}

/// Admin listing of bare slots inside a range.
pub struct AdminQueryRecentTrain<T> {
    trains: Arc<T>,
}

impl<T> AdminQueryRecentTrain<T> {
    pub fn new(trains: Arc<T>) -> Self {
        Self { trains }
    }
}

#[async_trait]
impl<T: TrainRepository> UseCase for AdminQueryRecentTrain<T> {
    type Request = TrainRangeRequest;
    type Response = Vec<TrainDate>;

    fn name(&self) -> &'static str {
        "AdminQueryRecentTrain"
    }

    async fn execute(&self, request: Self::Request) -> Result<Self::Response, Error> {
        self.trains
            .find_train_dates(&TrainDateFilter::Within(request.range))
            .await
            .map_err(|err| Error::wrap(self.name(), "FIND_TRAIN_DATES", err))
    }
}

/// The slot running at, or starting soonest after, an instant.
pub struct FindNearestTrainByTime<T> {
    trains: Arc<T>,
}

impl<T> FindNearestTrainByTime<T> {
    pub fn new(trains: Arc<T>) -> Self {
        Self { trains }
    }
}

#[async_trait]
impl<T: TrainRepository> UseCase for FindNearestTrainByTime<T> {
    type Request = TrainsAfterRequest;
    type Response = TrainDateWithAppointments;

    fn name(&self) -> &'static str {
        "FindNearestTrainByTime"
    }

    async fn execute(&self, request: Self::Request) -> Result<Self::Response, Error> {
        let found = self
            .trains
            .query_train_dates_with_appointments(&TrainDateFilter::EndsAfter(request.after))
            .await
            .map_err(|err| Error::wrap(self.name(), "QUERY_TRAIN_DATES", err))?;
        first_or_not_found(found, self.name(), || {
            format!("no train date after {}", request.after)
        })
    }
}

pub struct FindTrainHasApptsById<T> {
    trains: Arc<T>,
}

impl<T> FindTrainHasApptsById<T> {
    pub fn new(trains: Arc<T>) -> Self {
        Self { trains }
    }
}

#[async_trait]
impl<T: TrainRepository> UseCase for FindTrainHasApptsById<T> {
    type Request = TrainByIdRequest;
    type Response = TrainDateWithAppointments;

    fn name(&self) -> &'static str {
        "FindTrainHasApptsById"
    }

    async fn execute(&self, request: Self::Request) -> Result<Self::Response, Error> {
        let found = self
            .trains
            .query_train_dates_with_appointments(&TrainDateFilter::by_id(
                request.train_date_id.clone(),
            ))
            .await
            .map_err(|err| Error::wrap(self.name(), "QUERY_TRAIN_DATES", err))?;
        first_or_not_found(found, self.name(), || {
            format!("train date {} not found", request.train_date_id)
        })
    }
}

/// Upcoming slots as seen by one user.
pub struct UserQueryFutureTrain<T> {
    trains: Arc<T>,
}

impl<T> UserQueryFutureTrain<T> {
    pub fn new(trains: Arc<T>) -> Self {
        Self { trains }
    }
}

#[async_trait]
impl<T: TrainRepository> UseCase for UserQueryFutureTrain<T> {
    type Request = UserTrainsAfterRequest;
    type Response = Vec<UserTrainDateView>;

    fn name(&self) -> &'static str {
        "UserQueryFutureTrain"
    }

    async fn execute(&self, request: Self::Request) -> Result<Self::Response, Error> {
        self.trains
            .user_query_train_dates(&request.user_id, &TrainDateFilter::StartsFrom(request.after))
            .await
            .map_err(|err| Error::wrap(self.name(), "QUERY_TRAIN_DATES", err))
    }
}

pub struct UserQueryTrainById<T> {
    trains: Arc<T>,
}

impl<T> UserQueryTrainById<T> {
    pub fn new(trains: Arc<T>) -> Self {
        Self { trains }
    }
}

#[async_trait]
impl<T: TrainRepository> UseCase for UserQueryTrainById<T> {
    type Request = UserTrainByIdRequest;
    type Response = UserTrainDateView;

    fn name(&self) -> &'static str {
        "UserQueryTrainById"
    }

    async fn execute(&self, request: Self::Request) -> Result<Self::Response, Error> {
        let found = self
            .trains
            .user_query_train_dates(
                &request.user_id,
                &TrainDateFilter::by_id(request.train_date_id.clone()),
            )
            .await
            .map_err(|err| Error::wrap(self.name(), "QUERY_TRAIN_DATES", err))?;
        first_or_not_found(found, self.name(), || {
            format!("train date {} not found", request.train_date_id)
        })
    }
}
