//! Port for the shared result cache and per-key lock.
//!
//! Implementations live on a store every service instance can reach (Redis in
//! production). The lock must be acquired with an atomic create-if-absent so
//! that exactly one caller wins across processes.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::IdempotencyKey;

use super::define_port_error;

define_port_error! {
    /// Errors raised by idempotency store adapters.
    pub enum IdempotencyStoreError {
        /// The backing store could not be reached.
        Connection { message: String } => "idempotency store connection failed: {message}",
        /// A command reached the store but failed.
        Query { message: String } => "idempotency store command failed: {message}",
    }
}

/// Fencing token written into a lock on acquisition.
///
/// Release only succeeds while the stored token still matches, so a holder
/// whose lock already expired cannot delete a newer holder's lock.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockToken(String);

impl LockToken {
    /// Generate a random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Wrap an existing token value.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result cache plus mutual-exclusion lock, both keyed by [`IdempotencyKey`].
///
/// Records and locks live in separate namespaces and expire independently.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Fetch the serialised result stored for `key`, if it has not expired.
    async fn get_result(&self, key: &IdempotencyKey)
    -> Result<Option<Vec<u8>>, IdempotencyStoreError>;

    /// Store the serialised result for `key`, replacing any existing value.
    async fn save_result(
        &self,
        key: &IdempotencyKey,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), IdempotencyStoreError>;

    /// Atomically create the lock for `key` if none exists.
    ///
    /// Returns `Some(token)` when this caller now holds the lock and `None`
    /// when another holder has it.
    async fn acquire_lock(
        &self,
        key: &IdempotencyKey,
        ttl: Duration,
    ) -> Result<Option<LockToken>, IdempotencyStoreError>;

    /// Delete the lock for `key` if it still carries `token`.
    ///
    /// Returns `true` when a lock was deleted.
    async fn release_lock(
        &self,
        key: &IdempotencyKey,
        token: &LockToken,
    ) -> Result<bool, IdempotencyStoreError>;
}

/// Store used when idempotency is switched off.
///
/// Nothing is ever cached, every lock request is granted and every release
/// succeeds, so each keyed create behaves like an unkeyed one.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpIdempotencyStore;

#[async_trait]
impl IdempotencyStore for NoOpIdempotencyStore {
    async fn get_result(
        &self,
        _key: &IdempotencyKey,
    ) -> Result<Option<Vec<u8>>, IdempotencyStoreError> {
        Ok(None)
    }

    async fn save_result(
        &self,
        _key: &IdempotencyKey,
        _value: &[u8],
        _ttl: Duration,
    ) -> Result<(), IdempotencyStoreError> {
        Ok(())
    }

    async fn acquire_lock(
        &self,
        _key: &IdempotencyKey,
        _ttl: Duration,
    ) -> Result<Option<LockToken>, IdempotencyStoreError> {
        Ok(Some(LockToken::generate()))
    }

    async fn release_lock(
        &self,
        _key: &IdempotencyKey,
        _token: &LockToken,
    ) -> Result<bool, IdempotencyStoreError> {
        Ok(true)
    }
}
