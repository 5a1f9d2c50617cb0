//! Event notifier that keeps published events in memory.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::domain::UserEvent;
use crate::domain::ports::{EventNotifier, EventNotifierError};

/// Records every published event; can be told to fail instead.
#[derive(Debug, Default)]
pub struct RecordingEventNotifier {
    events: Mutex<Vec<UserEvent>>,
    failing: AtomicBool,
}

impl RecordingEventNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent publishes fail (without recording).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Events published so far, oldest first.
    pub fn events(&self) -> Vec<UserEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl EventNotifier for RecordingEventNotifier {
    async fn publish(&self, event: &UserEvent) -> Result<(), EventNotifierError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EventNotifierError::publish("recording notifier set to fail"));
        }
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}
