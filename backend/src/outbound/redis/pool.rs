//! Shared `bb8-redis` connection pool.
//!
//! One pool serves both the idempotency store and the event notifier. Each
//! pooled connection is a multiplexed async connection, so checkout is cheap
//! and commands from concurrent requests pipeline over it.

use std::time::Duration;

use bb8_redis::bb8::{Pool, PooledConnection};
use bb8_redis::redis;
use bb8_redis::RedisConnectionManager;

/// Errors that can occur while building or using the Redis pool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RedisPoolError {
    /// Failed to check out a connection.
    #[error("failed to get redis connection: {message}")]
    Checkout { message: String },

    /// Failed to build the pool (bad URL or unreachable server).
    #[error("failed to build redis pool: {message}")]
    Build { message: String },
}

impl RedisPoolError {
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout {
            message: message.into(),
        }
    }

    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }
}

/// Sizing and checkout timeout for [`RedisPool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisPoolConfig {
    pub redis_url: String,
    pub max_size: u32,
    pub connection_timeout: Duration,
}

impl RedisPoolConfig {
    pub const DEFAULT_MAX_SIZE: u32 = 16;
    pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(redis_url: impl Into<String>) -> Self {
        Self {
            redis_url: redis_url.into(),
            max_size: Self::DEFAULT_MAX_SIZE,
            connection_timeout: Self::DEFAULT_CONNECTION_TIMEOUT,
        }
    }
}

/// Cloneable handle to the Redis pool.
#[derive(Clone)]
pub struct RedisPool {
    inner: Pool<RedisConnectionManager>,
}

impl RedisPool {
    /// Build the pool and verify the server answers `PING`.
    ///
    /// # Errors
    ///
    /// Returns [`RedisPoolError::Build`] for an invalid URL or when the
    /// server cannot be reached.
    pub async fn new(config: RedisPoolConfig) -> Result<Self, RedisPoolError> {
        let manager = RedisConnectionManager::new(config.redis_url.as_str())
            .map_err(|err| RedisPoolError::build(err.to_string()))?;
        let inner = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| RedisPoolError::build(err.to_string()))?;
        let pool = Self { inner };

        let mut conn = pool
            .get()
            .await
            .map_err(|err| RedisPoolError::build(err.to_string()))?;
        let _pong: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|err| RedisPoolError::build(err.to_string()))?;
        drop(conn);

        Ok(pool)
    }

    /// Check out a connection.
    ///
    /// # Errors
    ///
    /// Returns [`RedisPoolError::Checkout`] when no connection becomes
    /// available within the configured timeout.
    pub async fn get(
        &self,
    ) -> Result<PooledConnection<'_, RedisConnectionManager>, RedisPoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| RedisPoolError::checkout(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn invalid_url_fails_to_build() {
        let result = RedisPool::new(RedisPoolConfig::new("not a url")).await;
        assert!(matches!(result, Err(RedisPoolError::Build { .. })));
    }
}
