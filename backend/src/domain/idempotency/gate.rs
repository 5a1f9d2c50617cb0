//! Check, acquire, check: arbitration of one keyed operation.
//!
//! [`IdempotencyGate::admit`] decides whether a keyed request replays a stored
//! result or proceeds to execute under the lock. A proceeding caller receives
//! a [`LockGuard`] that records the result and releases the lock. If the guard
//! is dropped without an explicit release (the request future was cancelled,
//! or the caller panicked), the release is spawned onto the current Tokio
//! runtime. A crashed process leaves the lock to expire.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::domain::Error;
use crate::domain::ports::{IdempotencyStore, IdempotencyStoreError, LockToken};

use super::{IdempotencyConfig, IdempotencyKey, StoreFailurePolicy};

/// Outcome of [`IdempotencyGate::admit`].
#[derive(Debug)]
pub enum Admission<T> {
    /// A previous execution already produced this result.
    Replay(T),
    /// Execute the operation, then record and release through the guard.
    Proceed(LockGuard),
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    PreCheck,
    Acquire,
    PostCheck,
}

impl Stage {
    const fn as_str(self) -> &'static str {
        match self {
            Self::PreCheck => "pre-check",
            Self::Acquire => "acquire",
            Self::PostCheck => "post-check",
        }
    }
}

/// Arbitrates keyed operations through an [`IdempotencyStore`].
#[derive(Clone)]
pub struct IdempotencyGate {
    store: Arc<dyn IdempotencyStore>,
    config: IdempotencyConfig,
}

impl IdempotencyGate {
    pub fn new(store: Arc<dyn IdempotencyStore>, config: IdempotencyConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub fn config(&self) -> &IdempotencyConfig {
        &self.config
    }

    /// Decide whether the operation for `key` replays or proceeds.
    ///
    /// # Errors
    ///
    /// - `AlreadyInProgress` when another holder owns the lock.
    /// - `InternalError` when the store fails and the policy is
    ///   [`StoreFailurePolicy::FailClosed`].
    pub async fn admit<T>(&self, key: &IdempotencyKey) -> Result<Admission<T>, Error>
    where
        T: DeserializeOwned,
    {
        if let Some(cached) = self.lookup(key, Stage::PreCheck).await? {
            debug!(idempotency_key = %key, "replaying stored result");
            return Ok(Admission::Replay(cached));
        }

        let guard = self.acquire(key).await?;

        // The winner of a previous lock may have finished between our
        // pre-check and acquire.
        match self.lookup(key, Stage::PostCheck).await {
            Ok(Some(cached)) => {
                debug!(idempotency_key = %key, "result stored while acquiring; replaying");
                guard.release().await;
                Ok(Admission::Replay(cached))
            }
            Ok(None) => Ok(Admission::Proceed(guard)),
            Err(err) => {
                guard.release().await;
                Err(err)
            }
        }
    }

    async fn lookup<T>(&self, key: &IdempotencyKey, stage: Stage) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned,
    {
        match self.store.get_result(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => Ok(Some(value)),
                Err(err) => {
                    warn!(
                        idempotency_key = %key,
                        stage = stage.as_str(),
                        error = %err,
                        "ignoring undecodable idempotency record"
                    );
                    Ok(None)
                }
            },
            Ok(None) => Ok(None),
            Err(err) => self.absorb(key, stage, &err).map(|()| None),
        }
    }

    async fn acquire(&self, key: &IdempotencyKey) -> Result<LockGuard, Error> {
        match self.store.acquire_lock(key, self.config.lock_ttl()).await {
            Ok(Some(token)) => Ok(self.guard(key, Some(token))),
            Ok(None) => {
                debug!(idempotency_key = %key, "lock held elsewhere");
                Err(Error::already_in_progress(
                    "a request with this idempotency key is already in progress",
                ))
            }
            Err(err) => {
                self.absorb(key, Stage::Acquire, &err)?;
                Ok(self.guard(key, None))
            }
        }
    }

    fn guard(&self, key: &IdempotencyKey, token: Option<LockToken>) -> LockGuard {
        LockGuard {
            store: Arc::clone(&self.store),
            key: key.clone(),
            token,
            result_ttl: self.config.result_ttl(),
        }
    }

    fn absorb(
        &self,
        key: &IdempotencyKey,
        stage: Stage,
        err: &IdempotencyStoreError,
    ) -> Result<(), Error> {
        match self.config.failure_policy() {
            StoreFailurePolicy::DegradeOpen => {
                warn!(
                    idempotency_key = %key,
                    stage = stage.as_str(),
                    error = %err,
                    "idempotency store unavailable; continuing without it"
                );
                Ok(())
            }
            StoreFailurePolicy::FailClosed => {
                error!(
                    idempotency_key = %key,
                    stage = stage.as_str(),
                    error = %err,
                    "idempotency store unavailable; rejecting request"
                );
                Err(Error::internal("idempotency store unavailable"))
            }
        }
    }
}

/// Scope of one admitted execution.
///
/// Holds the lock token (absent when the store was unreachable and the
/// policy let the request through unlocked).
pub struct LockGuard {
    store: Arc<dyn IdempotencyStore>,
    key: IdempotencyKey,
    token: Option<LockToken>,
    result_ttl: Duration,
}

impl LockGuard {
    /// Whether a lock is actually held.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.token.is_some()
    }

    /// Store `value` as the result for this key. Failures are logged only.
    pub async fn record<T>(&self, value: &T)
    where
        T: Serialize + ?Sized,
    {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(idempotency_key = %self.key, error = %err, "failed to encode result");
                return;
            }
        };
        if let Err(err) = self
            .store
            .save_result(&self.key, &bytes, self.result_ttl)
            .await
        {
            warn!(
                idempotency_key = %self.key,
                error = %err,
                "failed to store idempotency record"
            );
        }
    }

    /// Release the lock now.
    pub async fn release(mut self) {
        if let Some(token) = self.token.take() {
            release_lock(self.store.as_ref(), &self.key, &token).await;
        }
    }
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("key", &self.key)
            .field("locked", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = Arc::clone(&self.store);
                let key = self.key.clone();
                handle.spawn(async move {
                    release_lock(store.as_ref(), &key, &token).await;
                });
            }
            Err(_) => warn!(
                idempotency_key = %self.key,
                "no runtime to release lock; it will expire"
            ),
        }
    }
}

async fn release_lock(store: &dyn IdempotencyStore, key: &IdempotencyKey, token: &LockToken) {
    match store.release_lock(key, token).await {
        Ok(true) => debug!(idempotency_key = %key, "lock released"),
        Ok(false) => warn!(
            idempotency_key = %key,
            "lock already expired or taken over before release"
        ),
        Err(err) => warn!(
            idempotency_key = %key,
            error = %err,
            "failed to release lock; it will expire"
        ),
    }
}
