//! Process-local `IdempotencyStore` with clock-driven expiry.
//!
//! Lock arbitration only holds within one process. Multi-instance
//! deployments must use the Redis adapter.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::IdempotencyKey;
use crate::domain::ports::{IdempotencyStore, IdempotencyStoreError, LockToken};

#[derive(Debug, Default)]
struct Entries {
    results: HashMap<String, (Vec<u8>, DateTime<Utc>)>,
    locks: HashMap<String, (LockToken, DateTime<Utc>)>,
}

/// Result cache and lock table held in memory.
pub struct InMemoryIdempotencyStore {
    entries: Mutex<Entries>,
    clock: Arc<dyn Clock>,
    offline: AtomicBool,
}

impl InMemoryIdempotencyStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            clock,
            offline: AtomicBool::new(false),
        }
    }

    /// Simulate the store becoming unreachable (or reachable again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Whether an unexpired lock exists for `key`.
    pub fn is_locked(&self, key: &IdempotencyKey) -> bool {
        let now = self.clock.utc();
        self.entries()
            .locks
            .get(key.as_ref())
            .is_some_and(|(_, expires_at)| *expires_at > now)
    }

    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_online(&self) -> Result<(), IdempotencyStoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(IdempotencyStoreError::connection("in-memory store offline"));
        }
        Ok(())
    }

    fn expiry(&self, ttl: Duration) -> Result<DateTime<Utc>, IdempotencyStoreError> {
        TimeDelta::from_std(ttl)
            .ok()
            .and_then(|ttl| self.clock.utc().checked_add_signed(ttl))
            .ok_or_else(|| IdempotencyStoreError::query(format!("ttl {ttl:?} out of range")))
    }
}

impl std::fmt::Debug for InMemoryIdempotencyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryIdempotencyStore")
            .field("offline", &self.offline.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn get_result(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<Vec<u8>>, IdempotencyStoreError> {
        self.ensure_online()?;
        let now = self.clock.utc();
        let mut entries = self.entries();
        let Some((value, expires_at)) = entries.results.get(key.as_ref()) else {
            return Ok(None);
        };
        if *expires_at > now {
            return Ok(Some(value.clone()));
        }
        entries.results.remove(key.as_ref());
        Ok(None)
    }

    async fn save_result(
        &self,
        key: &IdempotencyKey,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), IdempotencyStoreError> {
        self.ensure_online()?;
        let expires_at = self.expiry(ttl)?;
        self.entries()
            .results
            .insert(key.as_ref().to_owned(), (value.to_vec(), expires_at));
        Ok(())
    }

    async fn acquire_lock(
        &self,
        key: &IdempotencyKey,
        ttl: Duration,
    ) -> Result<Option<LockToken>, IdempotencyStoreError> {
        self.ensure_online()?;
        let now = self.clock.utc();
        let expires_at = self.expiry(ttl)?;
        let mut entries = self.entries();
        let held = entries
            .locks
            .get(key.as_ref())
            .is_some_and(|(_, held_until)| *held_until > now);
        if held {
            return Ok(None);
        }
        let token = LockToken::generate();
        entries
            .locks
            .insert(key.as_ref().to_owned(), (token.clone(), expires_at));
        Ok(Some(token))
    }

    async fn release_lock(
        &self,
        key: &IdempotencyKey,
        token: &LockToken,
    ) -> Result<bool, IdempotencyStoreError> {
        self.ensure_online()?;
        let mut entries = self.entries();
        match entries.locks.get(key.as_ref()) {
            Some((held, _)) if held == token => {
                entries.locks.remove(key.as_ref());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
