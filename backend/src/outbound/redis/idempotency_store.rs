//! Redis-backed `IdempotencyStore`.
//!
//! Key layout, with `<ns>` the configured namespace:
//!
//! - `<ns>:result:<key>` holds the serialised result, `SET ... PX <ttl>`.
//! - `<ns>:lock:<key>` holds the fencing token, `SET ... NX PX <ttl>`.
//!
//! Release runs a compare-and-delete script so a caller whose lock expired
//! cannot remove a lock that has since been taken by someone else.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::redis::{self, Script};
use tracing::debug;

use crate::domain::IdempotencyKey;
use crate::domain::ports::{IdempotencyStore, IdempotencyStoreError, LockToken};

use super::pool::{RedisPool, RedisPoolError};

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "idempotency";

static RELEASE_SCRIPT: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
end
return 0
"#,
    )
});

/// Redis implementation of the idempotency port.
#[derive(Clone)]
pub struct RedisIdempotencyStore {
    pool: RedisPool,
    namespace: String,
}

impl RedisIdempotencyStore {
    pub fn new(pool: RedisPool, namespace: impl Into<String>) -> Self {
        Self {
            pool,
            namespace: namespace.into(),
        }
    }

    fn result_key(&self, key: &IdempotencyKey) -> String {
        namespaced(&self.namespace, "result", key)
    }

    fn lock_key(&self, key: &IdempotencyKey) -> String {
        namespaced(&self.namespace, "lock", key)
    }
}

fn namespaced(namespace: &str, kind: &str, key: &IdempotencyKey) -> String {
    format!("{namespace}:{kind}:{key}")
}

fn map_pool_error(error: RedisPoolError) -> IdempotencyStoreError {
    match error {
        RedisPoolError::Checkout { message } | RedisPoolError::Build { message } => {
            IdempotencyStoreError::connection(message)
        }
    }
}

fn map_redis_error(error: &redis::RedisError) -> IdempotencyStoreError {
    debug!(kind = ?error.kind(), "redis command failed");
    if error.is_io_error() || error.is_connection_dropped() || error.is_timeout() {
        IdempotencyStoreError::connection(error.to_string())
    } else {
        IdempotencyStoreError::query(error.to_string())
    }
}

/// Milliseconds for `PX`, never zero (Redis rejects `PX 0`).
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl IdempotencyStore for RedisIdempotencyStore {
    async fn get_result(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<Vec<u8>>, IdempotencyStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(self.result_key(key))
            .query_async(&mut *conn)
            .await
            .map_err(|err| map_redis_error(&err))?;
        Ok(value)
    }

    async fn save_result(
        &self,
        key: &IdempotencyKey,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), IdempotencyStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (): () = redis::cmd("SET")
            .arg(self.result_key(key))
            .arg(value)
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut *conn)
            .await
            .map_err(|err| map_redis_error(&err))?;
        Ok(())
    }

    async fn acquire_lock(
        &self,
        key: &IdempotencyKey,
        ttl: Duration,
    ) -> Result<Option<LockToken>, IdempotencyStoreError> {
        let token = LockToken::generate();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let reply: Option<String> = redis::cmd("SET")
            .arg(self.lock_key(key))
            .arg(token.as_str())
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut *conn)
            .await
            .map_err(|err| map_redis_error(&err))?;
        Ok(reply.map(|_| token))
    }

    async fn release_lock(
        &self,
        key: &IdempotencyKey,
        token: &LockToken,
    ) -> Result<bool, IdempotencyStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted: i64 = RELEASE_SCRIPT
            .key(self.lock_key(key))
            .arg(token.as_str())
            .invoke_async(&mut *conn)
            .await
            .map_err(|err| map_redis_error(&err))?;
        Ok(deleted > 0)
    }
}
