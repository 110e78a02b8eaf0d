//! Outbound adapters implementing the booking ports.
//!
//! - **memory**: process-local store used without a database and in tests
//! - **persistence**: PostgreSQL repositories using Diesel
//! - **cache**: Redis-backed cache invalidation
//! - **identity**: UUID v7 identifiers
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business rules.

pub mod cache;
pub mod identity;
pub mod memory;
pub mod persistence;
