//! In-process adapters.
//!
//! Used when no database or Redis URL is configured, and by tests. None of
//! them coordinate across processes.

mod event_notifier;
mod idempotency_store;
mod user_repository;

pub use event_notifier::RecordingEventNotifier;
pub use idempotency_store::InMemoryIdempotencyStore;
pub use user_repository::InMemoryUserRepository;
