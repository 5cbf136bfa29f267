//! Data-access objects over the user store.
//!
//! # Responsibility
//! - Define the `users` data-access contract.
//! - Keep SQL text inside this boundary.
//!
//! # Invariants
//! - Writes run `User::validate()` before any SQL mutation.
//! - A missing row on lookup is `Ok(None)`, not an error.

pub mod user_dao;
