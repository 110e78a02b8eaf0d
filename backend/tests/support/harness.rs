//! Registry wired over the in-memory store with a settable clock.

use std::sync::Arc;

use booking::domain::ports::SequentialIdentityGenerator;
use booking::domain::usecases::{
    BookingPorts, CreateAppointmentRequest, CreateTrainDateRequest, UseCase, UseCaseRegistry,
    UseCaseSettings,
};
use booking::domain::{Appointment, TrainDate};
use booking::outbound::memory::InMemoryBookingStore;
use booking::test_support::{MutableClock, RecordingCacheQueue, at, coach, parent};

pub struct Harness {
    pub store: Arc<InMemoryBookingStore>,
    pub clock: Arc<MutableClock>,
    pub cache: Arc<RecordingCacheQueue>,
    pub registry: UseCaseRegistry,
}

impl Harness {
    /// Clock starts at 08:00 on the fixture day.
    pub fn new() -> Self {
        let store = Arc::new(InMemoryBookingStore::new());
        let clock = Arc::new(MutableClock::new(at(8)));
        let cache = Arc::new(RecordingCacheQueue::default());
        let registry = UseCaseRegistry::new(
            BookingPorts {
                trains: Arc::clone(&store),
                appointments: Arc::clone(&store),
                stats: Arc::clone(&store),
                ids: Arc::new(SequentialIdentityGenerator::new("rec")),
                cache: Arc::clone(&cache) as _,
                clock: Arc::clone(&clock) as _,
            },
            UseCaseSettings::default(),
        );
        Self {
            store,
            clock,
            cache,
            registry,
        }
    }

    /// One-hour slot starting at `start_hour` on the fixture day.
    pub async fn slot(&self, start_hour: u32, capacity: u32) -> TrainDate {
        self.registry
            .create_train_date
            .execute(CreateTrainDateRequest {
                coach_id: coach(),
                location: "Main hall".to_owned(),
                capacity,
                start: at(start_hour),
                end: at(start_hour + 1),
            })
            .await
            .expect("slot created")
    }

    pub async fn book(&self, train_date_id: &str, user_id: &str, child: &str) -> Appointment {
        let mut booked = self
            .registry
            .create_appointment
            .execute(booking_request(train_date_id, user_id, child))
            .await
            .expect("booking succeeds");
        booked.remove(0)
    }

    pub fn available(&self, train_date_id: &str) -> u32 {
        self.store
            .train_date(train_date_id)
            .expect("slot stored")
            .available_capacity()
    }
}

pub fn booking_request(train_date_id: &str, user_id: &str, child: &str) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        train_date_id: train_date_id.to_owned(),
        user: parent(user_id),
        child_labels: vec![child.to_owned()],
    }
}
