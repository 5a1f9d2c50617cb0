//! User write coordinator and read pass-through.
//!
//! [`UserService`] implements both driving ports. Creates with an
//! idempotency key run through the [`IdempotencyGate`]; every other operation
//! goes straight to the repository. Successful mutations publish a
//! [`UserEvent`] whose failure is logged and never returned to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info, warn};

use super::idempotency::{Admission, IdempotencyConfig, IdempotencyGate, IdempotencyKey};
use super::ports::{
    EventNotifier, IdempotencyStore, UserIdGenerator, UserPersistenceError, UserRepository,
    UsersCommand, UsersQuery,
};
use super::{
    CreateUserRequest, Error, UpdateUserRequest, User, UserEvent, UserEventMethod, UserId,
    UserValidationError,
};

/// Collaborators required by [`UserService`].
pub struct UserServicePorts {
    pub repository: Arc<dyn UserRepository>,
    pub idempotency_store: Arc<dyn IdempotencyStore>,
    pub notifier: Arc<dyn EventNotifier>,
    pub id_generator: Arc<dyn UserIdGenerator>,
    pub clock: Arc<dyn Clock>,
}

/// Coordinates user creation, updates and deletion.
#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    gate: IdempotencyGate,
    notifier: Arc<dyn EventNotifier>,
    id_generator: Arc<dyn UserIdGenerator>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(ports: UserServicePorts, config: IdempotencyConfig) -> Self {
        let UserServicePorts {
            repository,
            idempotency_store,
            notifier,
            id_generator,
            clock,
        } = ports;
        Self {
            repository,
            gate: IdempotencyGate::new(idempotency_store, config),
            notifier,
            id_generator,
            clock,
        }
    }

    /// Validate, build and persist a brand-new user.
    async fn create_fresh(&self, request: CreateUserRequest) -> Result<User, Error> {
        let attributes = request.validate().map_err(map_validation_error)?;
        let id = self.id_generator.next_id().map_err(|err| {
            warn!(error = %err, "user id generation failed");
            Error::build_failed("failed to build user")
        })?;
        let user = User::create(id, attributes, self.clock.utc());
        self.repository
            .create(&user)
            .await
            .map_err(map_persistence_error)?;
        info!(user_id = %user.id(), "user created");
        Ok(user)
    }

    async fn notify(&self, method: UserEventMethod) {
        let event = UserEvent::new(method, self.clock.utc());
        if let Err(err) = self.notifier.publish(&event).await {
            warn!(method = %method, error = %err, "failed to publish user event");
        }
    }

    async fn load(&self, id: &UserId) -> Result<User, Error> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(map_persistence_error)?
            .ok_or_else(|| Error::not_found(format!("user {id} not found")))
    }
}

fn map_validation_error(err: UserValidationError) -> Error {
    Error::invalid_request(err.to_string())
}

fn map_persistence_error(err: UserPersistenceError) -> Error {
    match err {
        UserPersistenceError::NotFound { id } => Error::not_found(format!("user {id} not found")),
        other => {
            warn!(error = %other, "user repository failure");
            Error::internal(other.to_string())
        }
    }
}

#[async_trait]
impl UsersCommand for UserService {
    async fn create_user(
        &self,
        idempotency_key: Option<IdempotencyKey>,
        request: CreateUserRequest,
    ) -> Result<User, Error> {
        let Some(key) = idempotency_key else {
            let user = self.create_fresh(request).await?;
            self.notify(UserEventMethod::Create).await;
            return Ok(user);
        };

        let guard = match self.gate.admit::<User>(&key).await? {
            Admission::Replay(user) => {
                debug!(idempotency_key = %key, user_id = %user.id(), "create replayed");
                return Ok(user);
            }
            Admission::Proceed(guard) => guard,
        };

        let outcome = self.create_fresh(request).await;
        if let Ok(user) = &outcome {
            guard.record(user).await;
            self.notify(UserEventMethod::Create).await;
        }
        guard.release().await;
        outcome
    }

    async fn update_user(&self, id: &UserId, request: UpdateUserRequest) -> Result<User, Error> {
        let changes = request.validate().map_err(map_validation_error)?;
        let mut user = self.load(id).await?;
        user.apply(changes, self.clock.utc());
        self.repository
            .update(&user)
            .await
            .map_err(map_persistence_error)?;
        info!(user_id = %id, "user updated");
        self.notify(UserEventMethod::Update).await;
        Ok(user)
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), Error> {
        self.repository
            .delete(id)
            .await
            .map_err(map_persistence_error)?;
        info!(user_id = %id, "user deleted");
        self.notify(UserEventMethod::Delete).await;
        Ok(())
    }
}

#[async_trait]
impl UsersQuery for UserService {
    async fn get_user(&self, id: &UserId) -> Result<User, Error> {
        self.load(id).await
    }

    async fn list_users(&self) -> Result<Vec<User>, Error> {
        self.repository
            .list_all()
            .await
            .map_err(map_persistence_error)
    }
}
