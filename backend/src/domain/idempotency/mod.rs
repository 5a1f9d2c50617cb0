//! Idempotent execution of keyed creates.
//!
//! - [`IdempotencyKey`]: opaque client key sent via the `Idempotency-Key`
//!   header.
//! - [`IdempotencyConfig`]: record lifetime, lock lifetime and
//!   [`StoreFailurePolicy`].
//! - [`IdempotencyGate`]: the pre-check / acquire / post-check protocol over an
//!   [`IdempotencyStore`](crate::domain::ports::IdempotencyStore), yielding an
//!   [`Admission`].
//!
//! Mutual exclusion is delegated entirely to the store's atomic lock; nothing
//! here takes an in-process mutex, so several service instances behind a load
//! balancer arbitrate correctly.

mod config;
mod gate;
mod key;

pub use config::{IdempotencyConfig, StoreFailurePolicy, UnknownPolicyError};
pub use gate::{Admission, IdempotencyGate, LockGuard};
pub use key::{IdempotencyKey, IdempotencyKeyValidationError, MAX_KEY_LEN};
