//! Booking core: entities, ports and use cases.
//!
//! Purpose: Model training slots and the appointments parents book against
//! them. Entities enforce their own lifecycle guards; use cases orchestrate
//! repositories through the traits in [`ports`] and never touch a database
//! directly.
//!
//! Public surface:
//! - [`TrainDate`] and [`Appointment`] with their creation inputs and errors.
//! - [`Error`], the uniform failure returned by every use case.
//! - [`usecases`], one struct per business operation.
//! - [`spawn_cache_worker`], the background cache invalidation pool.

mod appointment;
pub mod cache_worker;
mod coach_availability;
pub(crate) mod compensation;
pub mod error;
pub mod ports;
mod read_models;
mod time_range;
mod train_date;
mod user;
pub mod usecases;

pub use self::appointment::{
    Appointment, AppointmentDraft, AppointmentError, AppointmentStatus, LeaveInfo, LeaveStatus,
    NewAppointment,
};
pub use self::cache_worker::{
    CacheWorkerConfig, CacheWorkerHandle, RunningCacheWorker, spawn_cache_worker,
};
pub use self::coach_availability::find_batch_overlap;
pub use self::compensation::CompensationPolicy;
pub use self::error::{Error, ErrorCause, ErrorCode, ErrorKind};
pub use self::read_models::{
    AppointmentWithTrainDate, BookedSeat, ChildStats, StatsEntry, TrainDateSummary,
    TrainDateWithAppointments, UserApptStats, UserTrainDateView,
};
pub use self::time_range::{TimeRange, TimeRangeError};
pub use self::train_date::{
    NewTrainDate, TrainDate, TrainDateDraft, TrainDateError, TrainDateStatus,
    UnknownStatus,
};
pub use self::user::{User, UserId, UserValidationError};

