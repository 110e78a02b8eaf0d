//! Port for minting opaque record identifiers.

use std::sync::atomic::{AtomicU64, Ordering};

/// Produces globally unique ids for new slots and appointments.
#[cfg_attr(test, mockall::automock)]
pub trait IdentityGenerator: Send + Sync {
    fn generate_id(&self) -> String;
}

/// Deterministic generator yielding `{prefix}-1`, `{prefix}-2`, ...
#[derive(Debug)]
pub struct SequentialIdentityGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdentityGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl Default for SequentialIdentityGenerator {
    fn default() -> Self {
        Self::new("id")
    }
}

impl IdentityGenerator for SequentialIdentityGenerator {
    fn generate_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{n}", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use super::*;
    use rstest::rstest;

    #[rstest]
    fn sequential_ids_are_distinct_and_ordered() {
        let ids = SequentialIdentityGenerator::new("appt");
        assert_eq!(ids.generate_id(), "appt-1");
        assert_eq!(ids.generate_id(), "appt-2");
    }
}
