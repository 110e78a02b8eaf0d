//! Batch attendance marking for one slot.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use super::UseCase;
use super::lookup::require_train_date;
use crate::domain::ports::{AppointmentFilter, AppointmentRepository, CacheQueue, TrainRepository};
use crate::domain::{Appointment, Error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInRequest {
    pub train_date_id: String,
    pub appointment_ids: Vec<String>,
}

/// Marks the listed appointments of a slot as attended.
///
/// Ids that do not belong to the slot are skipped. A single guard failure
/// rejects the whole batch and nothing is written.
pub struct CheckIn<T, A> {
    trains: Arc<T>,
    appointments: Arc<A>,
    cache: Arc<dyn CacheQueue>,
    clock: Arc<dyn Clock>,
}

impl<T, A> CheckIn<T, A> {
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
        }
    }
}

#[async_trait]
impl<T, A> UseCase for CheckIn<T, A>
where
    T: TrainRepository,
    A: AppointmentRepository,
{
    type Request = CheckInRequest;
    type Response = Vec<Appointment>;

    fn name(&self) -> &'static str {
        "CheckIn"
    }

    async fn execute(&self, request: Self::Request) -> Result<Self::Response, Error> {
        let name = self.name();
        if request.appointment_ids.is_empty() {
            return Err(Error::invalid_request(
                name,
                "NO_APPOINTMENT_CHECKED_IN",
                "at least one appointment id is required",
            ));
        }

        let booked = self
            .appointments
            .find_appointments(&AppointmentFilter::ByTrainDate(
                request.train_date_id.clone(),
            ))
            .await
            .map_err(|err| Error::wrap(name, "FIND_APPOINTMENTS", err))?;
        if booked.is_empty() {
            return Err(Error::not_found(
                name,
                "APPOINTMENT_NOT_FOUND",
                format!("train date {} has no appointments", request.train_date_id),
            ));
        }
        let train_date =
            require_train_date(self.trains.as_ref(), name, &request.train_date_id).await?;

        let now = self.clock.utc();
        let slot_start = train_date.period().start();
        let mut by_id: HashMap<String, Appointment> = booked
            .into_iter()
            .map(|appointment| (appointment.id().to_owned(), appointment))
            .collect();
        let mut seen = HashSet::new();
        let mut attended = Vec::with_capacity(request.appointment_ids.len());
        for id in &request.appointment_ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            let Some(mut appointment) = by_id.remove(id) else {
                continue;
            };
            appointment
                .mark_as_attended(slot_start, now)
                .map_err(|err| {
                    Error::wrap(name, "MARK_AS_ATTENDED", err)
                        .with_details(serde_json::json!({ "appointmentId": id }))
                })?;
            attended.push(appointment);
        }

        if attended.is_empty() {
            return Ok(attended);
        }
        self.appointments
            .update_many_appointments(&attended)
            .await
            .map_err(|err| Error::wrap(name, "UPDATE_APPOINTMENTS", err))?;

        let users: BTreeSet<&str> = attended
            .iter()
            .map(|appointment| appointment.user().id().as_str())
            .collect();
        for user_id in users {
            self.cache.clean(user_id, &request.train_date_id);
        }
        Ok(attended)
    }
}
