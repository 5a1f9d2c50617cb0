//! Client-supplied idempotency key.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Longest key accepted, in bytes.
pub const MAX_KEY_LEN: usize = 255;

/// Validation errors for [`IdempotencyKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdempotencyKeyValidationError {
    EmptyKey,
    SurroundingWhitespace,
    TooLong { max: usize },
}

impl fmt::Display for IdempotencyKeyValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyKey => write!(f, "idempotency key must not be empty"),
            Self::SurroundingWhitespace => {
                write!(f, "idempotency key must not start or end with whitespace")
            }
            Self::TooLong { max } => write!(f, "idempotency key must be at most {max} bytes"),
        }
    }
}

impl std::error::Error for IdempotencyKeyValidationError {}

/// Opaque key naming one logical create operation.
///
/// Any non-empty string up to [`MAX_KEY_LEN`] bytes is accepted, so clients
/// may send UUIDs, ULIDs or their own request identifiers.
///
/// ```
/// # use user_service::domain::idempotency::IdempotencyKey;
/// let key = IdempotencyKey::new("abc-1").expect("valid key");
/// assert_eq!(key.as_ref(), "abc-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Validate and construct an [`IdempotencyKey`].
    pub fn new(key: impl Into<String>) -> Result<Self, IdempotencyKeyValidationError> {
        let key = key.into();
        if key.is_empty() {
            return Err(IdempotencyKeyValidationError::EmptyKey);
        }
        if key.trim() != key {
            return Err(IdempotencyKeyValidationError::SurroundingWhitespace);
        }
        if key.len() > MAX_KEY_LEN {
            return Err(IdempotencyKeyValidationError::TooLong { max: MAX_KEY_LEN });
        }
        Ok(Self(key))
    }

    /// Generate a random key (UUIDv4 text).
    #[must_use]
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl AsRef<str> for IdempotencyKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<IdempotencyKey> for String {
    fn from(value: IdempotencyKey) -> Self {
        value.0
    }
}

impl TryFrom<String> for IdempotencyKey {
    type Error = IdempotencyKeyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
