//! `EventNotifier` publishing to Redis pub/sub channels.
//!
//! Each event goes to `<prefix>.<method>` as a JSON payload. Pub/sub is
//! at-most-once: subscribers that are not connected miss the event.

use async_trait::async_trait;
use bb8_redis::redis;
use tracing::debug;

use crate::domain::UserEvent;
use crate::domain::ports::{EventNotifier, EventNotifierError};

use super::pool::RedisPool;

/// Subject prefix used when none is configured.
pub const DEFAULT_SUBJECT_PREFIX: &str = "user.events";

#[derive(Clone)]
pub struct RedisEventNotifier {
    pool: RedisPool,
    subject_prefix: String,
}

impl RedisEventNotifier {
    pub fn new(pool: RedisPool, subject_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            subject_prefix: subject_prefix.into(),
        }
    }
}

#[async_trait]
impl EventNotifier for RedisEventNotifier {
    async fn publish(&self, event: &UserEvent) -> Result<(), EventNotifierError> {
        let payload =
            serde_json::to_vec(event).map_err(|err| EventNotifierError::encode(err.to_string()))?;
        let subject = event.subject(&self.subject_prefix);
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| EventNotifierError::publish(err.to_string()))?;
        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(&subject)
            .arg(payload)
            .query_async(&mut *conn)
            .await
            .map_err(|err| EventNotifierError::publish(err.to_string()))?;
        debug!(subject, receivers, "user event published");
        Ok(())
    }
}
