//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`UserRepository`, `IdempotencyStore`, `EventNotifier`,
//! `UserIdGenerator`) are implemented by outbound adapters. Driving ports
//! (`UsersCommand`, `UsersQuery`) are implemented by the domain service and
//! consumed by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod event_notifier;
mod idempotency_store;
mod user_id_generator;
mod user_repository;
mod users_command;
mod users_query;

#[cfg(test)]
pub use event_notifier::MockEventNotifier;
pub use event_notifier::{EventNotifier, EventNotifierError, NoOpEventNotifier};
#[cfg(test)]
pub use idempotency_store::MockIdempotencyStore;
pub use idempotency_store::{
    IdempotencyStore, IdempotencyStoreError, LockToken, NoOpIdempotencyStore,
};
#[cfg(test)]
pub use user_id_generator::MockUserIdGenerator;
pub use user_id_generator::{TimeOrderedIdGenerator, UserIdGenerationError, UserIdGenerator};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
#[cfg(test)]
pub use users_command::MockUsersCommand;
pub use users_command::UsersCommand;
#[cfg(test)]
pub use users_query::MockUsersQuery;
pub use users_query::UsersQuery;
