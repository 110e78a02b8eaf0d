//! Leave requests and their withdrawal.
//!
//! Taking leave frees a seat (increase, then persist); withdrawing leave takes
//! it back (deduct, then persist). Either persist failure is compensated by
//! the inverse capacity call.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use super::UseCase;
use super::lookup::{require_appointment, require_train_date};
use crate::domain::compensation::{CapacityAdjustment, CapacityCompensation, CompensationPolicy};
use crate::domain::ports::{AppointmentRepository, CacheQueue, TrainRepository};
use crate::domain::{Appointment, Error, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateLeaveRequest {
    pub appointment_id: String,
    pub user_id: UserId,
    pub reason: String,
}

pub struct CreateLeave<T, A> {
    trains: Arc<T>,
    appointments: Arc<A>,
    cache: Arc<dyn CacheQueue>,
    clock: Arc<dyn Clock>,
    compensation: CompensationPolicy,
}

impl<T, A> CreateLeave<T, A> {
    pub fn new(
        trains: Arc<T>,
        appointments: Arc<A>,
        cache: Arc<dyn CacheQueue>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            trains,
            appointments,
            cache,
            clock,
            compensation: CompensationPolicy::default(),
        }
    }

    pub fn with_compensation(mut self, compensation: CompensationPolicy) -> Self {
        self.compensation = compensation;
        self
    }
}

#[async_trait]
impl<T, A> UseCase for CreateLeave<T, A>
where
    T: TrainRepository + 'static,
    A: AppointmentRepository,
{
    type Request = CreateLeaveRequest;
    type Response = Appointment;

    fn name(&self) -> &'static str {
        "CreateLeave"
    }

    async fn execute(&self, request: Self::Request) -> Result<Self::Response, Error> {
        let name = self.name();
        let mut appointment =
            require_appointment(self.appointments.as_ref(), name, &request.appointment_id).await?;
        if !appointment.belongs_to(&request.user_id) {
            return Err(Error::forbidden(
                name,
                "PERMISSION_DENIED",
                "appointment belongs to another user",
            ));
        }
        let train_date =
            require_train_date(self.trains.as_ref(), name, appointment.train_date_id()).await?;
        appointment
            .append_leave_record(&request.reason, train_date.period().start(), self.clock.utc())
            .map_err(|err| Error::wrap(name, "APPEND_LEAVE", err))?;

        self.trains
            .increase_capacity(train_date.id(), 1)
            .await
            .map_err(|err| Error::wrap(name, "INCREASE_CAPACITY", err))?;
        let guard = CapacityCompensation::arm(
            Arc::clone(&self.trains),
            train_date.id(),
            1,
            CapacityAdjustment::Deduct,
            self.compensation,
            name,
        );

        if let Err(err) = self.appointments.update_appointment(&appointment).await {
            guard.compensate().await;
            return Err(Error::wrap(name, "SAVE_LEAVE", err));
        }
        guard.disarm();

        self.cache.clean(request.user_id.as_str(), train_date.id());
        Ok(appointment)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelLeaveRequest {
    pub appointment_id: String,
    pub user_id: UserId,
}

pub struct CancelLeave<T, A> {
    trains: Arc<T>,
    appointments: Arc<A>,
    cache: Arc<dyn CacheQueue>,
    clock: Arc<dyn Clock>,
    compensation: CompensationPolicy,
}

impl<T, A> CancelLeave<T, A> {
    pub fn new(
        trains: Arc<T>,
        appointments: Arc<A>,
        cache: Arc<dyn CacheQueue>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            trains,
            appointments,
            cache,
            clock,
            compensation: CompensationPolicy::default(),
        }
    }

    pub fn with_compensation(mut self, compensation: CompensationPolicy) -> Self {
        self.compensation = compensation;
        self
    }
}

#[async_trait]
impl<T, A> UseCase for CancelLeave<T, A>
where
    T: TrainRepository + 'static,
    A: AppointmentRepository,
{
    type Request = CancelLeaveRequest;
    type Response = Appointment;

    fn name(&self) -> &'static str {
        "CancelLeave"
    }

    async fn execute(&self, request: Self::Request) -> Result<Self::Response, Error> {
        let name = self.name();
        let mut appointment =
            require_appointment(self.appointments.as_ref(), name, &request.appointment_id).await?;
        appointment
            .cancel_leave(&request.user_id, self.clock.utc())
            .map_err(|err| Error::wrap(name, "CANCEL_LEAVE", err))?;

        let train_date_id = appointment.train_date_id().to_owned();
        self.trains
            .deduct_capacity(&train_date_id, 1)
            .await
            .map_err(|err| Error::wrap(name, "DEDUCT_CAPACITY", err))?;
        let guard = CapacityCompensation::arm(
            Arc::clone(&self.trains),
            train_date_id.as_str(),
            1,
            CapacityAdjustment::Increase,
            self.compensation,
            name,
        );

        if let Err(err) = self.appointments.update_appointment(&appointment).await {
            guard.compensate().await;
            return Err(Error::wrap(name, "UPDATE_APPOINTMENT", err));
        }
        guard.disarm();

        self.cache.clean(request.user_id.as_str(), &train_date_id);
        Ok(appointment)
    }
}

#[cfg(test)]
#[path = "leave_write_tests.rs"]
mod tests;
