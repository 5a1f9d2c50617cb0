//! Port for publishing user events to the shared bus.

use async_trait::async_trait;

use crate::domain::UserEvent;

use super::define_port_error;

define_port_error! {
    /// Errors raised by event publishers.
    ///
    /// Callers log these and carry on; publishing is best effort.
    pub enum EventNotifierError {
        /// The event could not be encoded.
        Encode { message: String } => "event encoding failed: {message}",
        /// The bus rejected the event or could not be reached.
        Publish { message: String } => "event publish failed: {message}",
    }
}

/// Fire-and-forget publisher. At most once, no retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn publish(&self, event: &UserEvent) -> Result<(), EventNotifierError>;
}

/// Publisher used when eventing is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpEventNotifier;

#[async_trait]
impl EventNotifier for NoOpEventNotifier {
    async fn publish(&self, _event: &UserEvent) -> Result<(), EventNotifierError> {
        Ok(())
    }
}
