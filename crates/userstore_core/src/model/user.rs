//! User domain model.
//!
//! # Invariants
//! - `id` is non-blank and never changes after creation.
//! - Field names serialize as `id`, `userName`, `isActive` to match the
//!   column layout of the `users` table.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Primary key of a stored user.
pub type UserId = String;

/// One row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    /// Display name; may be replaced at any time.
    pub user_name: String,
    pub is_active: bool,
}

/// Validation failures for user writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id cannot be empty"),
        }
    }
}

impl Error for UserValidationError {}

impl User {
    /// Creates an active user with a freshly generated UUIDv4 id.
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_name: user_name.into(),
            is_active: true,
        }
    }

    /// Creates a user with a caller-provided id.
    ///
    /// Does not validate; writes call [`User::validate`] before any SQL.
    pub fn with_id(id: impl Into<UserId>, user_name: impl Into<String>, is_active: bool) -> Self {
        Self {
            id: id.into(),
            user_name: user_name.into(),
            is_active,
        }
    }

    /// Returns a copy carrying a different display name.
    pub fn renamed(&self, user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            ..self.clone()
        }
    }

    /// Checks the invariants that must hold before persistence.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.id.trim().is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{User, UserValidationError};
    use uuid::Uuid;

    #[test]
    fn new_user_gets_uuid_id_and_is_active() {
        let user = User::new("someone");
        assert!(Uuid::parse_str(&user.id).is_ok());
        assert!(user.is_active);
        assert_eq!(user.user_name, "someone");
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(User::new("a").id, User::new("a").id);
    }

    #[test]
    fn validate_rejects_blank_id() {
        let user = User::with_id("   ", "name", true);
        assert_eq!(user.validate(), Err(UserValidationError::EmptyId));
        assert!(User::with_id("id", "name", true).validate().is_ok());
    }

    #[test]
    fn renamed_keeps_id_and_flag() {
        let user = User::with_id("id", "old", false);
        let renamed = user.renamed("new");
        assert_eq!(renamed, User::with_id("id", "new", false));
    }

    #[test]
    fn serializes_with_column_names() {
        let user = User::with_id("id", "username", true);
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": "id", "userName": "username", "isActive": true })
        );
        let back: User = serde_json::from_value(json).unwrap();
        assert_eq!(back, user);
    }
}
