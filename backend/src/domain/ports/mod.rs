//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod appointment_repository;
mod booking_cache;
mod cache_key;
mod cache_queue;
mod filters;
mod identity_generator;
mod repository_error;
mod stats_repository;
mod train_repository;

#[cfg(test)]
pub use appointment_repository::MockAppointmentRepository;
pub use appointment_repository::AppointmentRepository;
#[cfg(test)]
pub use booking_cache::MockBookingCache;
pub use booking_cache::{BookingCache, BookingCacheError, BookingCacheErrorKind, NoopBookingCache};
#[cfg(test)]
pub use cache_queue::MockCacheQueue;
pub use cache_key::{CacheKeyValidationError, StatsCacheKey, TrainCacheKey};
pub use cache_queue::CacheQueue;
pub use filters::{AppointmentFilter, AppointmentPageKey, StatsFilter, TrainDateFilter};
#[cfg(test)]
pub use identity_generator::MockIdentityGenerator;
pub use identity_generator::{IdentityGenerator, SequentialIdentityGenerator};
pub use repository_error::{
    AppointmentCursor, RepositoryError, RepositoryErrorKind, decode_appointment_cursor,
};
#[cfg(test)]
pub use stats_repository::MockStatsRepository;
pub use stats_repository::StatsRepository;
#[cfg(test)]
pub use train_repository::MockTrainRepository;
pub use train_repository::TrainRepository;
