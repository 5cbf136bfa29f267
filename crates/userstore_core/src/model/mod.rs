//! Domain model for the user store.
//!
//! # Invariants
//! - A user is identified by a stable, non-blank string id.
//! - Replacing a user rewrites every field; there is no partial update.

pub mod user;
