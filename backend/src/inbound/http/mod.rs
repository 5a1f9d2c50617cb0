//! HTTP inbound adapter exposing the user REST endpoints.

pub mod error;
pub mod health;
pub mod idempotency;
pub mod state;
pub mod users;

pub use error::{ApiResult, json_config};
