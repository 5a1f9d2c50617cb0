//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL user repository using Diesel
//! - **redis**: idempotency store and event publisher over one `bb8` pool
//! - **memory**: process-local stand-ins for development and tests
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod memory;
pub mod persistence;
pub mod redis;
