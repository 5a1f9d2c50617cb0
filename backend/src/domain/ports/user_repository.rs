//! Port abstraction for durable user storage.

use async_trait::async_trait;

use crate::domain::{User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised when persisting or loading users.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// No row exists for the requested identifier.
        NotFound { id: String } => "user {id} not found",
    }
}

/// CRUD operations over stored users.
///
/// Each call is atomic on its own; there is no cross-call transaction and no
/// optimistic concurrency check on update.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user.
    async fn create(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// All users, newest `created_at` first.
    async fn list_all(&self) -> Result<Vec<User>, UserPersistenceError>;

    /// Overwrite the mutable fields of an existing user.
    ///
    /// Fails with [`UserPersistenceError::NotFound`] when no row matches.
    async fn update(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Remove a user permanently.
    ///
    /// Fails with [`UserPersistenceError::NotFound`] when no row matches.
    async fn delete(&self, id: &UserId) -> Result<(), UserPersistenceError>;
}
