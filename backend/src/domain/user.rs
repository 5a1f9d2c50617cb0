//! User aggregate and the request shapes that create or change it.
//!
//! Requests arrive unvalidated from adapters. [`CreateUserRequest::validate`]
//! and [`UpdateUserRequest::validate`] turn them into [`NewUser`] and
//! [`UserChanges`], the only inputs [`User`] accepts.

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Role assigned when a create request omits one or sends an empty string.
pub const DEFAULT_ROLE: &str = "user";

/// Validation errors for user identifiers and request payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    EmptyName,
    EmptyEmail,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must not contain surrounding whitespace"),
            Self::EmptyName => write!(f, "name is required"),
            Self::EmptyEmail => write!(f, "email is required"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Opaque user identifier.
///
/// Identifiers minted by the service are UUIDv7 strings, so lexical order
/// follows creation order. Identifiers read back from storage or requests are
/// accepted as-is once they pass the emptiness and whitespace checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: impl Into<String>) -> Result<Self, UserValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }
        Ok(Self(id))
    }

    /// Mint a fresh time-ordered identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Payload for creating a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Defaults to `"user"` when omitted or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "admin")]
    pub role: Option<String>,
}

impl CreateUserRequest {
    /// Check required fields and resolve the default role.
    pub fn validate(self) -> Result<NewUser, UserValidationError> {
        let Self { name, email, role } = self;
        if is_blank(&name) {
            return Err(UserValidationError::EmptyName);
        }
        if is_blank(&email) {
            return Err(UserValidationError::EmptyEmail);
        }
        let role = role
            .filter(|role| !is_blank(role))
            .unwrap_or_else(|| DEFAULT_ROLE.to_owned());
        Ok(NewUser { name, email, role })
    }
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// An empty role is ignored rather than clearing the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl UpdateUserRequest {
    /// Reject supplied-but-empty name or email and drop an empty role.
    pub fn validate(self) -> Result<UserChanges, UserValidationError> {
        let Self { name, email, role } = self;
        if name.as_deref().is_some_and(is_blank) {
            return Err(UserValidationError::EmptyName);
        }
        if email.as_deref().is_some_and(is_blank) {
            return Err(UserValidationError::EmptyEmail);
        }
        Ok(UserChanges {
            name,
            email,
            role: role.filter(|role| !is_blank(role)),
        })
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Validated attributes for a user that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    name: String,
    email: String,
    role: String,
}

/// Validated field changes for an existing user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    name: Option<String>,
    email: Option<String>,
    role: Option<String>,
}

/// A user of the service.
///
/// ## Invariants
/// - `name` and `email` are non-blank.
/// - `updated_at >= created_at`.
/// - Timestamps carry microsecond precision so values survive a round trip
///   through PostgreSQL unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[schema(value_type = String, example = "01890a5d-ac96-774b-bcce-b302099a8057")]
    id: UserId,
    #[schema(example = "Ada Lovelace")]
    name: String,
    #[schema(example = "ada@example.com")]
    email: String,
    #[schema(example = "user")]
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Assemble a new user stamped with `now`.
    #[must_use]
    pub fn create(id: UserId, attributes: NewUser, now: DateTime<Utc>) -> Self {
        let now = now.trunc_subsecs(6);
        let NewUser { name, email, role } = attributes;
        Self {
            id,
            name,
            email,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a user from stored fields.
    ///
    /// A stored `updated_at` earlier than `created_at` is raised to
    /// `created_at`.
    #[must_use]
    pub fn from_stored(
        id: UserId,
        name: String,
        email: String,
        role: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            role,
            created_at,
            updated_at: updated_at.max(created_at),
        }
    }

    /// Apply validated changes and bump `updated_at`.
    pub fn apply(&mut self, changes: UserChanges, now: DateTime<Utc>) {
        let UserChanges { name, email, role } = changes;
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(email) = email {
            self.email = email;
        }
        if let Some(role) = role {
            self.role = role;
        }
        self.updated_at = now.trunc_subsecs(6).max(self.created_at);
    }

    #[must_use]
    pub fn id(&self) -> &UserId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
