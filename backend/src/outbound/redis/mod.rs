//! Redis adapters: connection pool, idempotency store and event notifier.

mod event_notifier;
mod idempotency_store;
mod pool;

pub use event_notifier::{DEFAULT_SUBJECT_PREFIX, RedisEventNotifier};
pub use idempotency_store::{DEFAULT_NAMESPACE, RedisIdempotencyStore};
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError};
