//! Port for minting user identifiers.

use crate::domain::UserId;

use super::define_port_error;

define_port_error! {
    /// Identifier generation failed.
    pub enum UserIdGenerationError {
        Unavailable { message: String } => "user id generation failed: {message}",
    }
}

/// Source of fresh, time-orderable user identifiers.
#[cfg_attr(test, mockall::automock)]
pub trait UserIdGenerator: Send + Sync {
    fn next_id(&self) -> Result<UserId, UserIdGenerationError>;
}

/// UUIDv7 generator backed by the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeOrderedIdGenerator;

impl UserIdGenerator for TimeOrderedIdGenerator {
    fn next_id(&self) -> Result<UserId, UserIdGenerationError> {
        Ok(UserId::generate())
    }
}
