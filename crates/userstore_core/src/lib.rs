//! Core persistence logic for the user store.
//! This crate owns the `users` table and every rule about its rows.

pub mod dao;
pub mod database;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;

pub use dao::user_dao::{DaoError, DaoResult, SqliteUserDao, UserDao};
pub use database::{UserDaoHandle, UsersDatabase};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::user::{User, UserId, UserValidationError};
pub use service::user_service::UserService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
