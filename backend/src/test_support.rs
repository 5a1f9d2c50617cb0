//! Test utilities shared by unit tests and the integration suites under
//! `tests/`. Compiled for `cfg(test)` and the `test-support` feature.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::ports::TimeOrderedIdGenerator;
use crate::domain::{IdempotencyConfig, UserService, UserServicePorts};
pub use crate::outbound::memory::{
    InMemoryIdempotencyStore, InMemoryUserRepository, RecordingEventNotifier,
};

/// Clock frozen at a chosen instant until explicitly advanced.
#[derive(Debug)]
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock forward by `delta`.
    ///
    /// # Panics
    ///
    /// Panics when `delta` does not fit a [`TimeDelta`].
    pub fn advance(&self, delta: Duration) {
        let delta = TimeDelta::from_std(delta)
            .unwrap_or_else(|err| panic!("duration {delta:?} out of range: {err}"));
        *self.now() += delta;
    }

    fn now(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now()
    }
}

/// A [`UserService`] wired to in-memory adapters, with handles on each.
pub struct InMemoryUsers {
    pub service: UserService,
    pub repository: Arc<InMemoryUserRepository>,
    pub store: Arc<InMemoryIdempotencyStore>,
    pub notifier: Arc<RecordingEventNotifier>,
    pub clock: Arc<MutableClock>,
}

impl InMemoryUsers {
    pub fn new(config: IdempotencyConfig) -> Self {
        let clock = Arc::new(MutableClock::new(Utc::now()));
        let repository = Arc::new(InMemoryUserRepository::new());
        let store = Arc::new(InMemoryIdempotencyStore::new(clock.clone()));
        let notifier = Arc::new(RecordingEventNotifier::new());
        let service = UserService::new(
            UserServicePorts {
                repository: repository.clone(),
                idempotency_store: store.clone(),
                notifier: notifier.clone(),
                id_generator: Arc::new(TimeOrderedIdGenerator),
                clock: clock.clone(),
            },
            config,
        );
        Self {
            service,
            repository,
            store,
            notifier,
            clock,
        }
    }
}

impl Default for InMemoryUsers {
    fn default() -> Self {
        Self::new(IdempotencyConfig::default())
    }
}
