//! Domain primitives, ports and the user service.
//!
//! Public surface:
//! - [`Error`] / [`ErrorCode`]: transport-agnostic failure taxonomy.
//! - [`User`], [`UserId`], [`CreateUserRequest`], [`UpdateUserRequest`].
//! - [`UserEvent`]: notifications emitted after successful mutations.
//! - [`idempotency`]: keys, configuration and the lock-arbitration gate.
//! - [`UserService`]: implementation of the `UsersCommand` and `UsersQuery`
//!   driving ports.

pub mod error;
pub mod idempotency;
pub mod ports;
pub mod trace_id;
pub mod user;
pub mod user_events;
pub mod user_service;

pub use self::error::{Error, ErrorCode};
pub use self::idempotency::{IdempotencyConfig, IdempotencyKey, StoreFailurePolicy};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    CreateUserRequest, DEFAULT_ROLE, NewUser, UpdateUserRequest, User, UserChanges, UserId,
    UserValidationError,
};
pub use self::user_events::{UserEvent, UserEventMethod};
pub use self::user_service::{UserService, UserServicePorts};
