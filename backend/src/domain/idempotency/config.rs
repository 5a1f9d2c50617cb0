//! Tunables for the idempotent create path.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What to do when the idempotency store cannot be reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreFailurePolicy {
    /// Log and continue as if the record were absent and the lock granted.
    /// Duplicates become possible while the store is down.
    #[default]
    DegradeOpen,
    /// Reject keyed creates with an internal error while the store is down.
    FailClosed,
}

impl StoreFailurePolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DegradeOpen => "degrade-open",
            Self::FailClosed => "fail-closed",
        }
    }
}

impl fmt::Display for StoreFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a policy name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown store failure policy `{0}`; expected `degrade-open` or `fail-closed`")]
pub struct UnknownPolicyError(String);

impl FromStr for StoreFailurePolicy {
    type Err = UnknownPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "degrade-open" | "degrade_open" => Ok(Self::DegradeOpen),
            "fail-closed" | "fail_closed" => Ok(Self::FailClosed),
            other => Err(UnknownPolicyError(other.to_owned())),
        }
    }
}

/// Record and lock lifetimes plus the store failure policy.
///
/// ```
/// # use user_service::domain::idempotency::{IdempotencyConfig, StoreFailurePolicy};
/// # use std::time::Duration;
/// let config = IdempotencyConfig::default()
///     .with_result_ttl_hours(0)
///     .with_failure_policy(StoreFailurePolicy::FailClosed);
/// assert_eq!(config.result_ttl(), Duration::from_secs(3600));
/// assert_eq!(config.lock_ttl(), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyConfig {
    result_ttl: Duration,
    lock_ttl: Duration,
    failure_policy: StoreFailurePolicy,
}

impl IdempotencyConfig {
    pub const DEFAULT_RESULT_TTL_HOURS: u64 = 24;
    const MIN_RESULT_TTL_HOURS: u64 = 1;
    /// Ten years.
    const MAX_RESULT_TTL_HOURS: u64 = 24 * 365 * 10;

    pub const DEFAULT_LOCK_TTL_SECS: u64 = 30;
    const MIN_LOCK_TTL_SECS: u64 = 1;
    const MAX_LOCK_TTL_SECS: u64 = 3600;

    /// Set the record lifetime in hours, clamped to `1..=87600`.
    #[must_use]
    pub fn with_result_ttl_hours(mut self, hours: u64) -> Self {
        let hours = hours.clamp(Self::MIN_RESULT_TTL_HOURS, Self::MAX_RESULT_TTL_HOURS);
        self.result_ttl = Duration::from_secs(hours * 3600);
        self
    }

    /// Set the lock lifetime in seconds, clamped to `1..=3600`.
    #[must_use]
    pub fn with_lock_ttl_secs(mut self, secs: u64) -> Self {
        let secs = secs.clamp(Self::MIN_LOCK_TTL_SECS, Self::MAX_LOCK_TTL_SECS);
        self.lock_ttl = Duration::from_secs(secs);
        self
    }

    /// Set an exact record lifetime, bypassing the clamp. Intended for tests.
    #[must_use]
    pub fn with_result_ttl(mut self, ttl: Duration) -> Self {
        self.result_ttl = ttl;
        self
    }

    /// Set an exact lock lifetime, bypassing the clamp. Intended for tests.
    #[must_use]
    pub fn with_lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_failure_policy(mut self, policy: StoreFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    #[must_use]
    pub fn result_ttl(&self) -> Duration {
        self.result_ttl
    }

    #[must_use]
    pub fn lock_ttl(&self) -> Duration {
        self.lock_ttl
    }

    #[must_use]
    pub fn failure_policy(&self) -> StoreFailurePolicy {
        self.failure_policy
    }
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self {
            result_ttl: Duration::from_secs(Self::DEFAULT_RESULT_TTL_HOURS * 3600),
            lock_ttl: Duration::from_secs(Self::DEFAULT_LOCK_TTL_SECS),
            failure_policy: StoreFailurePolicy::default(),
        }
    }
}
