//! Process-local `UserRepository` for development and tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{User, UserId};

/// Users held in a map guarded by a mutex.
///
/// Data is lost on restart and not shared between instances; use the Diesel
/// adapter for anything beyond a single process.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users().is_empty()
    }

    fn users(&self) -> MutexGuard<'_, HashMap<UserId, User>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut users = self.users();
        if users.contains_key(user.id()) {
            return Err(UserPersistenceError::query(format!(
                "duplicate user id {}",
                user.id()
            )));
        }
        users.insert(user.id().clone(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.users().get(id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>, UserPersistenceError> {
        let mut users: Vec<User> = self.users().values().cloned().collect();
        users.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().as_str().cmp(a.id().as_str()))
        });
        Ok(users)
    }

    async fn update(&self, user: &User) -> Result<(), UserPersistenceError> {
        match self.users().get_mut(user.id()) {
            Some(stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(UserPersistenceError::not_found(user.id().as_str())),
        }
    }

    async fn delete(&self, id: &UserId) -> Result<(), UserPersistenceError> {
        self.users()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| UserPersistenceError::not_found(id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CreateUserRequest;
    use chrono::{Duration, Utc};
    use rstest::rstest;

    fn user(name: &str, offset_secs: i64) -> User {
        let attributes = CreateUserRequest {
            name: name.to_owned(),
            email: format!("{name}@example.com"),
            role: None,
        }
        .validate()
        .expect("valid request");
        User::create(
            UserId::generate(),
            attributes,
            Utc::now() + Duration::seconds(offset_secs),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn list_is_newest_first() {
        let repo = InMemoryUserRepository::new();
        for (name, offset) in [("old", 0), ("newest", 20), ("middle", 10)] {
            repo.create(&user(name, offset)).await.expect("create");
        }

        let names: Vec<String> = repo
            .list_all()
            .await
            .expect("list")
            .iter()
            .map(|u| u.name().to_owned())
            .collect();

        assert_eq!(names, ["newest", "middle", "old"]);
    }

    #[rstest]
    #[tokio::test]
    async fn update_and_delete_report_missing_rows() {
        let repo = InMemoryUserRepository::new();
        let ghost = user("ghost", 0);

        assert_eq!(
            repo.update(&ghost).await,
            Err(UserPersistenceError::not_found(ghost.id().as_str()))
        );
        assert_eq!(
            repo.delete(ghost.id()).await,
            Err(UserPersistenceError::not_found(ghost.id().as_str()))
        );
    }

    #[rstest]
    #[tokio::test]
    async fn create_rejects_duplicate_ids() {
        let repo = InMemoryUserRepository::new();
        let ada = user("ada", 0);
        repo.create(&ada).await.expect("first insert");

        assert!(repo.create(&ada).await.is_err());
        assert_eq!(repo.len(), 1);
    }
}
