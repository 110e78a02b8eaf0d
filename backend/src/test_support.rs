//! Test utilities for the booking crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`). Only
//! compiled for tests or with the `test-support` feature.

mod clock;
mod fixtures;

pub use clock::MutableClock;
pub use fixtures::{
    RecordingCacheQueue, appointment, at, coach, parent, period, train_date,
    train_date_with_capacity,
};
