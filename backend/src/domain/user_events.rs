//! Domain events emitted after successful user mutations.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mutation that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserEventMethod {
    Create,
    Update,
    Delete,
}

impl UserEventMethod {
    /// Lowercase name used in payloads and subjects.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for UserEventMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification published on the event bus: `{"method": "...", "timestamp": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEvent {
    pub method: UserEventMethod,
    pub timestamp: DateTime<Utc>,
}

impl UserEvent {
    #[must_use]
    pub fn new(method: UserEventMethod, timestamp: DateTime<Utc>) -> Self {
        Self { method, timestamp }
    }

    /// Subject for this event under `prefix`, e.g. `user.events.create`.
    #[must_use]
    pub fn subject(&self, prefix: &str) -> String {
        format!("{prefix}.{}", self.method)
    }
}
