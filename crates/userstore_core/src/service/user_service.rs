//! User name use-cases.
//!
//! # Invariants
//! - Every write goes through `UserDao::insert_user`, so validation and
//!   full-replace semantics always apply.
//! - The service holds no state beyond its DAO.

use crate::dao::user_dao::{DaoResult, UserDao};
use crate::model::user::User;

/// Reads and renames users through any [`UserDao`].
pub struct UserService<D: UserDao> {
    dao: D,
}

impl<D: UserDao> UserService<D> {
    pub fn new(dao: D) -> Self {
        Self { dao }
    }

    /// Returns the display name of `id`, or `None` when the user is absent.
    pub fn user_name(&self, id: &str) -> DaoResult<Option<String>> {
        Ok(self.dao.get_user_by_id(id)?.map(|user| user.user_name))
    }

    /// Sets the display name of `id` and returns the stored user.
    ///
    /// # Contract
    /// - Existing user: `is_active` is carried over unchanged.
    /// - Missing user: a new active user is created with this id.
    pub fn update_user_name(&self, id: &str, user_name: impl Into<String>) -> DaoResult<User> {
        let updated = match self.dao.get_user_by_id(id)? {
            Some(existing) => existing.renamed(user_name),
            None => User::with_id(id, user_name, true),
        };
        self.dao.insert_user(&updated)?;
        Ok(updated)
    }

    /// Borrow the wrapped DAO for operations the service does not cover.
    pub fn dao(&self) -> &D {
        &self.dao
    }
}
