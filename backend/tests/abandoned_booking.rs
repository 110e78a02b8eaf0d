//! A booking abandoned mid-write hands its seats back.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use booking::domain::ports::{
    AppointmentFilter, AppointmentRepository, RepositoryError, SequentialIdentityGenerator,
    TrainDateFilter,
};
use booking::domain::usecases::{CreateAppointment, UseCase};
use booking::domain::{Appointment, AppointmentWithTrainDate};
use booking::outbound::memory::InMemoryBookingStore;
use booking::test_support::{MutableClock, RecordingCacheQueue, at};
use pagination::Page;
use rstest::rstest;
use tokio::sync::Notify;

#[path = "support/harness.rs"]
mod harness;

use harness::{Harness, booking_request};

/// Delegates to the in-memory store but never finishes a bulk insert.
struct StalledSaves {
    inner: Arc<InMemoryBookingStore>,
    entered: Arc<Notify>,
}

#[async_trait]
impl AppointmentRepository for StalledSaves {
    async fn save_appointment(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        self.inner.save_appointment(appointment).await
    }

    async fn save_many_appointments(
        &self,
        _appointments: &[Appointment],
    ) -> Result<(), RepositoryError> {
        self.entered.notify_one();
        std::future::pending().await
    }

    async fn delete_appointment(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        self.inner.delete_appointment(appointment).await
    }

    async fn update_appointment(&self, appointment: &Appointment) -> Result<(), RepositoryError> {
        self.inner.update_appointment(appointment).await
    }

    async fn update_many_appointments(
        &self,
        appointments: &[Appointment],
    ) -> Result<(), RepositoryError> {
        self.inner.update_many_appointments(appointments).await
    }

    async fn find_appointment_by_id(
        &self,
        id: &str,
    ) -> Result<Option<Appointment>, RepositoryError> {
        self.inner.find_appointment_by_id(id).await
    }

    async fn find_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<Appointment>, RepositoryError> {
        self.inner.find_appointments(filter).await
    }

    async fn page_find_with_train_date(
        &self,
        appointment_filter: &AppointmentFilter,
        train_date_filter: &TrainDateFilter,
        cursor: &str,
    ) -> Result<Page<AppointmentWithTrainDate>, RepositoryError> {
        self.inner
            .page_find_with_train_date(appointment_filter, train_date_filter, cursor)
            .await
    }
}

#[rstest]
#[tokio::test]
async fn dropping_a_booking_during_the_write_returns_the_seats() {
    let harness = Harness::new();
    let slot = harness.slot(12, 10).await;
    let entered = Arc::new(Notify::new());
    let create = Arc::new(CreateAppointment::new(
        Arc::clone(&harness.store),
        Arc::new(StalledSaves {
            inner: Arc::clone(&harness.store),
            entered: Arc::clone(&entered),
        }),
        Arc::new(SequentialIdentityGenerator::new("stalled")),
        Arc::new(RecordingCacheQueue::default()),
        Arc::new(MutableClock::new(at(8))),
    ));

    let task = tokio::spawn({
        let create = Arc::clone(&create);
        let request = booking_request(slot.id(), "user-a", "Amy");
        async move { create.execute(request).await }
    });
    entered.notified().await;
    assert_eq!(harness.available(slot.id()), 9);

    task.abort();
    let joined = task.await;
    assert!(joined.is_err_and(|err| err.is_cancelled()));

    let restored = tokio::time::timeout(Duration::from_secs(5), async {
        while harness.available(slot.id()) != 10 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(restored.is_ok(), "seat was not handed back");
    assert!(harness.store.appointments().is_empty());
}
