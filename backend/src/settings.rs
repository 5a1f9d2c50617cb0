//! Service configuration loaded via OrthoConfig.
//!
//! Values come from CLI flags, `USER_SERVICE_*` environment variables and an
//! optional configuration file. Unset optional values fall back to the
//! defaults exposed by the accessor methods.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::idempotency::{StoreFailurePolicy, UnknownPolicyError};
use crate::domain::IdempotencyConfig;
use crate::outbound::persistence::PoolConfig;
use crate::outbound::redis::{DEFAULT_NAMESPACE, DEFAULT_SUBJECT_PREFIX, RedisPoolConfig};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Runtime settings for the user service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "USER_SERVICE")]
pub struct ServiceSettings {
    /// Interface to bind.
    pub host: Option<String>,
    /// Port to bind.
    pub port: Option<u16>,
    /// PostgreSQL URL. Without it users are kept in memory.
    pub database_url: Option<String>,
    /// Redis URL for the idempotency store and event publishing.
    pub redis_url: Option<String>,
    /// Deduplicate keyed creates. On when unset.
    pub idempotency_enabled: Option<bool>,
    /// Lifetime of cached create results, in hours.
    pub idempotency_ttl_hours: Option<u64>,
    /// Lifetime of the per-key lock, in seconds.
    pub lock_ttl_secs: Option<u64>,
    /// `degrade-open` or `fail-closed`.
    pub idempotency_failure_policy: Option<String>,
    /// Key prefix in the idempotency store.
    pub idempotency_namespace: Option<String>,
    /// Publish user events (requires `redis_url`). Off when unset.
    pub events_enabled: Option<bool>,
    /// Subject prefix for published events.
    pub events_subject_prefix: Option<String>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Database connections kept open while idle.
    pub db_min_idle: Option<u32>,
    /// How long a request waits for a database connection, in seconds.
    pub db_connect_timeout_secs: Option<u64>,
    /// Upper bound on pooled Redis connections.
    pub redis_max_connections: Option<u32>,
    /// How long a request waits for a Redis connection, in milliseconds.
    pub redis_connect_timeout_ms: Option<u64>,
}

impl ServiceSettings {
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn idempotency_namespace(&self) -> &str {
        self.idempotency_namespace
            .as_deref()
            .unwrap_or(DEFAULT_NAMESPACE)
    }

    pub fn events_subject_prefix(&self) -> &str {
        self.events_subject_prefix
            .as_deref()
            .unwrap_or(DEFAULT_SUBJECT_PREFIX)
    }

    pub fn idempotency_enabled(&self) -> bool {
        self.idempotency_enabled.unwrap_or(true)
    }

    pub fn events_enabled(&self) -> bool {
        self.events_enabled.unwrap_or(false)
    }

    /// Database pool sizing, or `None` when no database is configured.
    pub fn db_pool_config(&self) -> Option<PoolConfig> {
        let url = self.database_url.as_deref()?;
        let mut config = PoolConfig::new(url);
        if let Some(max_size) = self.db_max_connections {
            config.max_size = max_size;
        }
        if let Some(min_idle) = self.db_min_idle {
            config.min_idle = Some(min_idle);
        }
        if let Some(secs) = self.db_connect_timeout_secs {
            config.connection_timeout = Duration::from_secs(secs);
        }
        Some(config)
    }

    /// Redis pool sizing, or `None` when no Redis server is configured.
    pub fn redis_pool_config(&self) -> Option<RedisPoolConfig> {
        let url = self.redis_url.as_deref()?;
        let mut config = RedisPoolConfig::new(url);
        if let Some(max_size) = self.redis_max_connections {
            config.max_size = max_size;
        }
        if let Some(millis) = self.redis_connect_timeout_ms {
            config.connection_timeout = Duration::from_millis(millis);
        }
        Some(config)
    }

    /// Parsed store failure policy, `degrade-open` when unset.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownPolicyError`] for an unrecognised value.
    pub fn failure_policy(&self) -> Result<StoreFailurePolicy, UnknownPolicyError> {
        self.idempotency_failure_policy
            .as_deref()
            .map_or(Ok(StoreFailurePolicy::default()), str::parse)
    }

    /// Idempotency settings with TTLs clamped to their accepted ranges.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownPolicyError`] for an unrecognised failure policy.
    pub fn idempotency_config(&self) -> Result<IdempotencyConfig, UnknownPolicyError> {
        let config = IdempotencyConfig::default()
            .with_result_ttl_hours(
                self.idempotency_ttl_hours
                    .unwrap_or(IdempotencyConfig::DEFAULT_RESULT_TTL_HOURS),
            )
            .with_lock_ttl_secs(
                self.lock_ttl_secs
                    .unwrap_or(IdempotencyConfig::DEFAULT_LOCK_TTL_SECS),
            )
            .with_failure_policy(self.failure_policy()?);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing and defaults.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 16] = [
        "USER_SERVICE_HOST",
        "USER_SERVICE_PORT",
        "USER_SERVICE_DATABASE_URL",
        "USER_SERVICE_REDIS_URL",
        "USER_SERVICE_IDEMPOTENCY_ENABLED",
        "USER_SERVICE_IDEMPOTENCY_TTL_HOURS",
        "USER_SERVICE_LOCK_TTL_SECS",
        "USER_SERVICE_IDEMPOTENCY_FAILURE_POLICY",
        "USER_SERVICE_IDEMPOTENCY_NAMESPACE",
        "USER_SERVICE_EVENTS_ENABLED",
        "USER_SERVICE_EVENTS_SUBJECT_PREFIX",
        "USER_SERVICE_DB_MAX_CONNECTIONS",
        "USER_SERVICE_DB_MIN_IDLE",
        "USER_SERVICE_DB_CONNECT_TIMEOUT_SECS",
        "USER_SERVICE_REDIS_MAX_CONNECTIONS",
        "USER_SERVICE_REDIS_CONNECT_TIMEOUT_MS",
    ];

    fn env_with(overrides: &[(&str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    fn load_from_empty_args() -> ServiceSettings {
        ServiceSettings::load_from_iter([OsString::from("user-service")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(env_with(&[]));

        let settings = load_from_empty_args();
        assert_eq!(settings.host(), DEFAULT_HOST);
        assert_eq!(settings.port(), DEFAULT_PORT);
        assert!(settings.database_url.is_none());
        assert!(settings.redis_url.is_none());
        assert!(settings.idempotency_enabled());
        assert!(!settings.events_enabled());
        assert!(settings.db_pool_config().is_none());
        assert!(settings.redis_pool_config().is_none());
        assert_eq!(settings.idempotency_namespace(), DEFAULT_NAMESPACE);
        assert_eq!(settings.events_subject_prefix(), DEFAULT_SUBJECT_PREFIX);
        assert_eq!(
            settings.idempotency_config().expect("valid policy"),
            IdempotencyConfig::default()
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(env_with(&[
            ("USER_SERVICE_PORT", "9090"),
            ("USER_SERVICE_REDIS_URL", "redis://cache:6379"),
            ("USER_SERVICE_IDEMPOTENCY_ENABLED", "false"),
            ("USER_SERVICE_IDEMPOTENCY_TTL_HOURS", "2"),
            ("USER_SERVICE_LOCK_TTL_SECS", "5"),
            ("USER_SERVICE_IDEMPOTENCY_FAILURE_POLICY", "fail-closed"),
            ("USER_SERVICE_EVENTS_ENABLED", "true"),
            ("USER_SERVICE_EVENTS_SUBJECT_PREFIX", "accounts"),
        ]));

        let settings = load_from_empty_args();
        assert_eq!(settings.port(), 9090);
        assert_eq!(settings.redis_url.as_deref(), Some("redis://cache:6379"));
        assert!(!settings.idempotency_enabled());
        assert!(settings.events_enabled());
        assert_eq!(settings.events_subject_prefix(), "accounts");

        let config = settings.idempotency_config().expect("valid policy");
        assert_eq!(config.result_ttl(), Duration::from_secs(2 * 3600));
        assert_eq!(config.lock_ttl(), Duration::from_secs(5));
        assert_eq!(config.failure_policy(), StoreFailurePolicy::FailClosed);
    }

    #[rstest]
    fn pool_sizing_flows_into_pool_configs() {
        let _guard = lock_env(env_with(&[
            ("USER_SERVICE_DATABASE_URL", "postgres://db/users"),
            ("USER_SERVICE_DB_MAX_CONNECTIONS", "25"),
            ("USER_SERVICE_DB_MIN_IDLE", "5"),
            ("USER_SERVICE_DB_CONNECT_TIMEOUT_SECS", "3"),
            ("USER_SERVICE_REDIS_URL", "redis://cache:6379"),
            ("USER_SERVICE_REDIS_MAX_CONNECTIONS", "8"),
            ("USER_SERVICE_REDIS_CONNECT_TIMEOUT_MS", "750"),
        ]));

        let settings = load_from_empty_args();
        let db = settings.db_pool_config().expect("database configured");
        assert_eq!(db.database_url, "postgres://db/users");
        assert_eq!(db.max_size, 25);
        assert_eq!(db.min_idle, Some(5));
        assert_eq!(db.connection_timeout, Duration::from_secs(3));

        let redis = settings.redis_pool_config().expect("redis configured");
        assert_eq!(redis.redis_url, "redis://cache:6379");
        assert_eq!(redis.max_size, 8);
        assert_eq!(redis.connection_timeout, Duration::from_millis(750));
    }

    #[rstest]
    fn pool_configs_keep_defaults_when_only_urls_are_set() {
        let _guard = lock_env(env_with(&[
            ("USER_SERVICE_DATABASE_URL", "postgres://db/users"),
            ("USER_SERVICE_REDIS_URL", "redis://cache:6379"),
        ]));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.db_pool_config(),
            Some(PoolConfig::new("postgres://db/users"))
        );
        assert_eq!(
            settings.redis_pool_config(),
            Some(RedisPoolConfig::new("redis://cache:6379"))
        );
    }

    #[rstest]
    fn out_of_range_ttls_are_clamped() {
        let _guard = lock_env(env_with(&[
            ("USER_SERVICE_IDEMPOTENCY_TTL_HOURS", "0"),
            ("USER_SERVICE_LOCK_TTL_SECS", "86400"),
        ]));

        let config = load_from_empty_args()
            .idempotency_config()
            .expect("valid policy");
        assert_eq!(config.result_ttl(), Duration::from_secs(3600));
        assert_eq!(config.lock_ttl(), Duration::from_secs(3600));
    }

    #[rstest]
    fn unknown_failure_policy_is_rejected() {
        let _guard = lock_env(env_with(&[(
            "USER_SERVICE_IDEMPOTENCY_FAILURE_POLICY",
            "best-effort",
        )]));

        assert!(load_from_empty_args().idempotency_config().is_err());
    }
}
