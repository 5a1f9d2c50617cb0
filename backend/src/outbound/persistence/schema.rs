//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// User records.
    ///
    /// `id` is an opaque string minted by the service (UUID v7 by default).
    users (id) {
        id -> Varchar,
        name -> Varchar,
        email -> Varchar,
        /// Free-form role label, `user` unless supplied.
        role -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
