//! Use-case services layered over the DAO contracts.
//!
//! Callers above this layer never see SQL or connections.

pub mod user_service;
