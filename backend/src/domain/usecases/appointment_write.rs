//! Booking and self-service cancellation.
//!
//! Both operations mutate the capacity counter first and the appointment
//! records second; a failed record write is compensated by the inverse
//! capacity call.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use super::UseCase;
use super::lookup::{require_appointment, require_train_date};
use crate::domain::compensation::{CapacityAdjustment, CapacityCompensation, CompensationPolicy};
use crate::domain::ports::{AppointmentRepository, CacheQueue, IdentityGenerator, TrainRepository};
use crate::domain::{Appointment, Error, NewAppointment, User, UserId};

/// Book one seat per child label in one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAppointmentRequest {
    pub train_date_id: String,
    pub user: User,
    pub child_labels: Vec<String>,
}

pub struct CreateAppointment<T, A> {
    trains: Arc<T>,
    appointments: Arc<A>,
    ids: Arc<dyn IdentityGenerator>,
    cache: Arc<dyn CacheQueue>,
    clock: Arc<dyn Clock>,
    compensation: CompensationPolicy,
}

impl<T, A> CreateAppointment<T, A> {
    pub fn new(
        trains: Arc<T>,
        appointments: Arc<A>,
        ids: Arc<dyn IdentityGenerator>,
        cache: Arc<dyn CacheQueue>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            trains,
            appointments,
            ids,
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

impl<T, A> CreateAppointment<T, A>
where
    T: TrainRepository + 'static,
    A: AppointmentRepository,
{
    const NAME: &'static str = "CreateAppointment";

    fn build_appointments(
        &self,
        request: &CreateAppointmentRequest,
    ) -> Result<Vec<Appointment>, Error> {
        if request.child_labels.is_empty() {
            return Err(Error::invalid_request(
                Self::NAME,
                "NO_CHILDREN",
                "at least one child label is required",
            ));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = request
            .child_labels
            .iter()
            .find(|label| !seen.insert(label.trim()))
        {
            return Err(Error::invalid_request(
                Self::NAME,
                "DUPLICATE_CHILD",
                format!("child label {duplicate} is listed twice"),
            ));
        }

        let now = self.clock.utc();
        request
            .child_labels
            .iter()
            .map(|label| {
                Appointment::book(
                    NewAppointment {
                        id: self.ids.generate_id(),
                        train_date_id: request.train_date_id.clone(),
                        user: request.user.clone(),
                        child_label: label.trim().to_owned(),
                    },
                    now,
                )
                .map_err(|err| Error::wrap(Self::NAME, "NEW_APPOINTMENT", err))
            })
            .collect()
    }
}

#[async_trait]
impl<T, A> UseCase for CreateAppointment<T, A>
where
    T: TrainRepository + 'static,
    A: AppointmentRepository,
{
    type Request = CreateAppointmentRequest;
    type Response = Vec<Appointment>;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn execute(&self, request: Self::Request) -> Result<Self::Response, Error> {
        let appointments = self.build_appointments(&request)?;
        let count = u32::try_from(appointments.len()).map_err(|_| {
            Error::invalid_request(Self::NAME, "TOO_MANY_CHILDREN", "too many child labels")
        })?;

        // Fast rejection on the stored snapshot; the atomic deduction below
        // is what actually serialises concurrent bookings.
        let mut train_date =
            require_train_date(self.trains.as_ref(), Self::NAME, &request.train_date_id).await?;
        train_date
            .reserve_spot(count, self.clock.utc())
            .map_err(|err| Error::wrap(Self::NAME, "RESERVE_SPOT", err))?;

        self.trains
            .deduct_capacity(&request.train_date_id, count)
            .await
            .map_err(|err| Error::wrap(Self::NAME, "DEDUCT_CAPACITY", err))?;
        let guard = CapacityCompensation::arm(
            Arc::clone(&self.trains),
            request.train_date_id.as_str(),
            count,
            CapacityAdjustment::Increase,
            self.compensation,
            Self::NAME,
        );

        if let Err(err) = self.appointments.save_many_appointments(&appointments).await {
            guard.compensate().await;
            return Err(Error::wrap(Self::NAME, "SAVE_APPOINTMENTS", err));
        }
        guard.disarm();

        self.cache
            .clean(request.user.id().as_str(), &request.train_date_id);
        Ok(appointments)
    }
}

/// Cancel a booking made by mistake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelAppointmentRequest {
    pub appointment_id: String,
    pub user_id: UserId,
}

pub struct CancelAppointment<T, A> {
    trains: Arc<T>,
    appointments: Arc<A>,
    cache: Arc<dyn CacheQueue>,
    clock: Arc<dyn Clock>,
    compensation: CompensationPolicy,
}

impl<T, A> CancelAppointment<T, A> {
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
impl<T, A> UseCase for CancelAppointment<T, A>
where
    T: TrainRepository + 'static,
    A: AppointmentRepository,
{
    type Request = CancelAppointmentRequest;
    type Response = Appointment;

    fn name(&self) -> &'static str {
        "CancelAppointment"
    }

    async fn execute(&self, request: Self::Request) -> Result<Self::Response, Error> {
        let name = self.name();
        let mut appointment =
            require_appointment(self.appointments.as_ref(), name, &request.appointment_id).await?;
        appointment
            .cancel_as_mistake(&request.user_id, self.clock.utc())
            .map_err(|err| Error::wrap(name, "CANCEL_APPOINTMENT", err))?;

        let train_date_id = appointment.train_date_id().to_owned();
        self.trains
            .increase_capacity(&train_date_id, 1)
            .await
            .map_err(|err| Error::wrap(name, "INCREASE_CAPACITY", err))?;
        let guard = CapacityCompensation::arm(
            Arc::clone(&self.trains),
            train_date_id.as_str(),
            1,
            CapacityAdjustment::Deduct,
            self.compensation,
            name,
        );

        if let Err(err) = self.appointments.delete_appointment(&appointment).await {
            guard.compensate().await;
            return Err(Error::wrap(name, "DELETE_APPOINTMENT", err));
        }
        guard.disarm();

        self.cache.clean(request.user_id.as_str(), &train_date_id);
        Ok(appointment)
    }
}

#[cfg(test)]
#[path = "appointment_write_tests.rs"]
mod tests;
