//! Slot scheduling and retirement.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::json;

use super::UseCase;
use super::lookup::require_train_date;
use crate::domain::ports::{IdentityGenerator, TrainRepository};
use crate::domain::{Error, NewTrainDate, TimeRange, TrainDate, UserId, find_batch_overlap};

/// Request to schedule one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTrainDateRequest {
    pub coach_id: UserId,
    pub location: String,
    pub capacity: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

struct SlotFactory<'a> {
    ids: &'a dyn IdentityGenerator,
    now: DateTime<Utc>,
    use_case: &'static str,
}

impl SlotFactory<'_> {
    fn build(&self, request: &CreateTrainDateRequest) -> Result<TrainDate, Error> {
        let period = TimeRange::new(request.start, request.end)
            .map_err(|err| Error::wrap(self.use_case, "INVALID_PERIOD", err))?;
        if period.is_empty() {
            return Err(Error::invalid_request(
                self.use_case,
                "EMPTY_PERIOD",
                "a slot must end after it starts",
            ));
        }
        TrainDate::schedule(
            NewTrainDate {
                id: self.ids.generate_id(),
                coach_id: request.coach_id.clone(),
                location: request.location.trim().to_owned(),
                capacity: request.capacity,
                period,
            },
            self.now,
        )
        .map_err(|err| Error::wrap(self.use_case, "NEW_TRAIN_DATE", err))
    }
}

pub struct CreateTrainDate<T> {
    trains: Arc<T>,
    ids: Arc<dyn IdentityGenerator>,
    clock: Arc<dyn Clock>,
}

impl<T> CreateTrainDate<T> {
    pub fn new(trains: Arc<T>, ids: Arc<dyn IdentityGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { trains, ids, clock }
    }
}

#[async_trait]
impl<T> UseCase for CreateTrainDate<T>
where
    T: TrainRepository,
{
    type Request = CreateTrainDateRequest;
    type Response = TrainDate;

    fn name(&self) -> &'static str {
        "CreateTrainDate"
    }

    async fn execute(&self, request: Self::Request) -> Result<Self::Response, Error> {
        let name = self.name();
        let train_date = SlotFactory {
            ids: self.ids.as_ref(),
            now: self.clock.utc(),
            use_case: name,
        }
        .build(&request)?;

        let busy = self
            .trains
            .check_overlap(train_date.coach_id(), &train_date.period())
            .await
            .map_err(|err| Error::wrap(name, "CHECK_OVERLAP", err))?;
        if busy {
            return Err(Error::conflict(
                name,
                "COACH_BUSY",
                "coach already has a slot in this period",
            ));
        }

        self.trains
            .save_train_date(&train_date)
            .await
            .map_err(|err| Error::wrap(name, "SAVE_TRAIN_DATE", err))?;
        Ok(train_date)
    }
}

/// Slots for one coach, created together or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCreateTrainDatesRequest {
    pub slots: Vec<CreateTrainDateRequest>,
}

pub struct BatchCreateTrainDates<T> {
    trains: Arc<T>,
    ids: Arc<dyn IdentityGenerator>,
    clock: Arc<dyn Clock>,
}

impl<T> BatchCreateTrainDates<T> {
    pub fn new(trains: Arc<T>, ids: Arc<dyn IdentityGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { trains, ids, clock }
    }
}

#[async_trait]
impl<T> UseCase for BatchCreateTrainDates<T>
where
    T: TrainRepository,
{
    type Request = BatchCreateTrainDatesRequest;
    type Response = Vec<TrainDate>;

    fn name(&self) -> &'static str {
        "BatchCreateTrainDates"
    }

    async fn execute(&self, request: Self::Request) -> Result<Self::Response, Error> {
        let name = self.name();
        let Some(first) = request.slots.first() else {
            return Err(Error::invalid_request(
                name,
                "EMPTY_BATCH",
                "at least one slot is required",
            ));
        };
        let coach_id = first.coach_id.clone();
        if request.slots.iter().any(|slot| slot.coach_id != coach_id) {
            return Err(Error::invalid_request(
                name,
                "MIXED_COACHES",
                "every slot in a batch must belong to the same coach",
            ));
        }

        let factory = SlotFactory {
            ids: self.ids.as_ref(),
            now: self.clock.utc(),
            use_case: name,
        };
        let train_dates = request
            .slots
            .iter()
            .map(|slot| factory.build(slot))
            .collect::<Result<Vec<_>, _>>()?;
        let periods: Vec<TimeRange> = train_dates.iter().map(TrainDate::period).collect();

        if let Some((earlier, later)) = find_batch_overlap(&periods) {
            return Err(Error::invalid_request(
                name,
                "BATCH_OVERLAP",
                "slots in the batch overlap each other",
            )
            .with_details(json!({
                "first": { "start": earlier.start(), "end": earlier.end() },
                "second": { "start": later.start(), "end": later.end() },
            })));
        }

        let busy = self
            .trains
            .has_any_overlap(&coach_id, &periods)
            .await
            .map_err(|err| Error::wrap(name, "CHECK_OVERLAP", err))?;
        if busy {
            return Err(Error::conflict(
                name,
                "COACH_BUSY",
                "coach already has a slot overlapping the batch",
            ));
        }

        self.trains
            .save_many_train_dates(&train_dates)
            .await
            .map_err(|err| Error::wrap(name, "SAVE_TRAIN_DATES", err))?;
        Ok(train_dates)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTrainDateRequest {
    pub train_date_id: String,
}

/// Retires a slot that holds no bookings.
pub struct DeleteTrainDate<T> {
    trains: Arc<T>,
    clock: Arc<dyn Clock>,
}

impl<T> DeleteTrainDate<T> {
    pub fn new(trains: Arc<T>, clock: Arc<dyn Clock>) -> Self {
        Self { trains, clock }
    }
}

#[async_trait]
impl<T> UseCase for DeleteTrainDate<T>
where
    T: TrainRepository,
{
    type Request = DeleteTrainDateRequest;
    type Response = TrainDate;

    fn name(&self) -> &'static str {
        "DeleteTrainDate"
    }

    async fn execute(&self, request: Self::Request) -> Result<Self::Response, Error> {
        let name = self.name();
        let mut train_date =
            require_train_date(self.trains.as_ref(), name, &request.train_date_id).await?;
        train_date
            .delete(self.clock.utc())
            .map_err(|err| Error::wrap(name, "DELETE_TRAIN_DATE", err))?;
        // The store re-checks the seat count, so a booking that raced this
        // read surfaces here as a conflict.
        self.trains
            .delete_train_date(&train_date)
            .await
            .map_err(|err| Error::wrap(name, "RETIRE_TRAIN_DATE", err))?;
        Ok(train_date)
    }
}

#[cfg(test)]
#[path = "train_date_write_tests.rs"]
mod tests;
