//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Implementations of the booking repository ports backed by PostgreSQL via
//! `diesel-async` and a `bb8` pool.
//!
//! - **Thin adapters**: repositories translate between Diesel rows and domain
//!   entities. Lifecycle rules stay in the domain.
//! - **Internal models**: `models.rs` and `schema.rs` never leave this module.
//! - **Atomic counters**: seat capacity changes are single conditional
//!   `UPDATE` statements, so concurrent processes never over-book.
//!
//! # Example
//!
//! ```ignore
//! use booking::outbound::persistence::{DbPool, DieselTrainRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/booking")).await?;
//! let trains = DieselTrainRepository::new(pool.clone());
//! ```

mod diesel_appointment_repository;
mod diesel_error_mapping;
mod diesel_stats_repository;
mod diesel_train_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_appointment_repository::DieselAppointmentRepository;
pub use diesel_stats_repository::DieselStatsRepository;
pub use diesel_train_repository::DieselTrainRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
