//! Identifier generation for new slots and appointments.

use uuid::Uuid;

use crate::domain::ports::IdentityGenerator;

/// Issues time-ordered UUID v7 strings, so ids sort by creation time.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV7Generator;

impl IdentityGenerator for UuidV7Generator {
    fn generate_id(&self) -> String {
        Uuid::now_v7().to_string()
    }
}
