//! Driving port for reading users.
//!
//! Inbound adapters depend on this trait rather than on the repository so
//! that persistence errors are already translated into domain [`Error`]s.

use async_trait::async_trait;

use crate::domain::{Error, User, UserId};

/// Read-side use cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersQuery: Send + Sync {
    /// Fetch one user; `NotFound` when absent.
    async fn get_user(&self, id: &UserId) -> Result<User, Error>;

    /// All users, newest first.
    async fn list_users(&self) -> Result<Vec<User>, Error>;
}
