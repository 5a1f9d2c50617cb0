//! Inbound adapters translating external requests into domain port calls.
//!
//! Only HTTP is implemented; see [`http`].

pub mod http;
