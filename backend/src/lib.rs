//! Training-slot booking core.
//!
//! The [`domain`] module holds entities, ports and use cases. Adapters for
//! PostgreSQL, Redis and in-process storage live under [`outbound`]; the
//! binary wires them into a [`domain::usecases::UseCaseRegistry`].

pub mod domain;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
