//! Driving port for changing users.

use async_trait::async_trait;

use crate::domain::{CreateUserRequest, Error, IdempotencyKey, UpdateUserRequest, User, UserId};

/// Write-side use cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersCommand: Send + Sync {
    /// Create a user.
    ///
    /// With a key, repeated calls return the first result for as long as the
    /// idempotency record lives, and a concurrent duplicate fails fast with
    /// `AlreadyInProgress`. Without a key every call creates a new user.
    async fn create_user(
        &self,
        idempotency_key: Option<IdempotencyKey>,
        request: CreateUserRequest,
    ) -> Result<User, Error>;

    /// Apply a partial update and return the stored result.
    async fn update_user(&self, id: &UserId, request: UpdateUserRequest) -> Result<User, Error>;

    /// Delete a user permanently.
    async fn delete_user(&self, id: &UserId) -> Result<(), Error>;
}
