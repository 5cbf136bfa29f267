//! User DAO contract and its SQLite implementation.
//!
//! # Responsibility
//! - Insert-or-replace, fetch, flag lookup and bulk delete over `users`.
//! - Reject connections that were not migrated by `db::open_db*`.
//!
//! # Invariants
//! - One row per id; an insert with an existing id fully replaces the row.
//! - `isActive` is stored as 0/1; any other value is reported as invalid data.
//! - Blank ids are rejected on write only; reads never re-validate ids.
//!
//! # See also
//! - DESIGN.md (open question decisions)

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::user::{User, UserValidationError};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const USERS_TABLE: &str = "users";
const USERS_COLUMNS: &[&str] = &["id", "userName", "isActive"];
const LOGGED_ID_CHARS: usize = 8;

pub type DaoResult<T> = Result<T, DaoError>;

#[derive(Debug)]
pub enum DaoError {
    Validation(UserValidationError),
    Db(DbError),
    NotFound(String),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    ConnectionPoisoned,
    TaskFailed(String),
    DatabaseInUse,
}

impl Display for DaoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "user not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted user data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with open_db or open_db_in_memory"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
            Self::ConnectionPoisoned => {
                write!(f, "database connection lock poisoned by a panicked task")
            }
            Self::TaskFailed(message) => write!(f, "database task failed: {message}"),
            Self::DatabaseInUse => write!(f, "database still has live dao handles"),
        }
    }
}

impl Error for DaoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UserValidationError> for DaoError {
    fn from(value: UserValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for DaoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for DaoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Data-access contract for the `users` table.
pub trait UserDao {
    /// Inserts `user`, or replaces every field of the row with the same id.
    fn insert_user(&self, user: &User) -> DaoResult<()>;
    /// Snapshot of the row with `id`, or `None` when absent.
    fn get_user_by_id(&self, id: &str) -> DaoResult<Option<User>>;
    /// Current `is_active` flag. Fails with `DaoError::NotFound` when absent.
    fn is_user_active(&self, id: &str) -> DaoResult<bool>;
    fn delete_all_users(&self) -> DaoResult<()>;
    fn count_users(&self) -> DaoResult<u64>;
}

impl<D: UserDao + ?Sized> UserDao for &D {
    fn insert_user(&self, user: &User) -> DaoResult<()> {
        (**self).insert_user(user)
    }

    fn get_user_by_id(&self, id: &str) -> DaoResult<Option<User>> {
        (**self).get_user_by_id(id)
    }

    fn is_user_active(&self, id: &str) -> DaoResult<bool> {
        (**self).is_user_active(id)
    }

    fn delete_all_users(&self) -> DaoResult<()> {
        (**self).delete_all_users()
    }

    fn count_users(&self) -> DaoResult<u64> {
        (**self).count_users()
    }
}

/// SQLite-backed user DAO borrowing a migrated connection.
pub struct SqliteUserDao<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserDao<'conn> {
    /// Wraps `conn` after checking that its schema is current.
    ///
    /// # Errors
    /// - `UninitializedConnection` when `PRAGMA user_version` is not the
    ///   latest migration.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the `users`
    ///   layout is incomplete.
    pub fn try_new(conn: &'conn Connection) -> DaoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version != expected_version {
            return Err(DaoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        ensure_users_layout(conn)?;
        Ok(Self { conn })
    }

    /// Wraps a connection already validated by [`SqliteUserDao::try_new`].
    pub(crate) fn from_checked(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserDao for SqliteUserDao<'_> {
    fn insert_user(&self, user: &User) -> DaoResult<()> {
        user.validate()?;

        // Why: REPLACE deletes and re-inserts the conflicting row, so no column
        // of the previous row survives the write.
        self.conn.execute(
            "INSERT OR REPLACE INTO users (id, userName, isActive)
             VALUES (?1, ?2, ?3);",
            params![user.id.as_str(), user.user_name.as_str(), user.is_active],
        )?;

        debug!(
            "event=user_insert module=dao status=ok id_prefix={}",
            id_prefix(&user.id)
        );
        Ok(())
    }

    fn get_user_by_id(&self, id: &str) -> DaoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, userName, isActive FROM users WHERE id = ?1;")?;

        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }

    fn is_user_active(&self, id: &str) -> DaoResult<bool> {
        let raw: Option<i64> = self
            .conn
            .query_row("SELECT isActive FROM users WHERE id = ?1;", [id], |row| {
                row.get(0)
            })
            .optional()?;

        match raw {
            Some(value) => parse_flag(value),
            None => Err(DaoError::NotFound(id.to_string())),
        }
    }

    fn delete_all_users(&self) -> DaoResult<()> {
        let removed = self.conn.execute("DELETE FROM users;", [])?;
        info!("event=users_delete_all module=dao status=ok removed={removed}");
        Ok(())
    }

    fn count_users(&self) -> DaoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| DaoError::InvalidData(format!("negative row count `{count}`")))
    }
}

fn ensure_users_layout(conn: &Connection) -> DaoResult<()> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let columns = stmt
        .query_map([USERS_TABLE], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    if columns.is_empty() {
        return Err(DaoError::MissingRequiredTable(USERS_TABLE));
    }

    if let Some(missing) = USERS_COLUMNS
        .iter()
        .copied()
        .find(|required| !columns.iter().any(|column| column.as_str() == *required))
    {
        return Err(DaoError::MissingRequiredColumn {
            table: USERS_TABLE,
            column: missing,
        });
    }

    Ok(())
}

// Why: the id check is a write-side rule only. Rows written by other tools
// are returned as stored so `get_user_by_id` and `is_user_active` agree.
fn parse_user_row(row: &Row<'_>) -> DaoResult<User> {
    Ok(User {
        id: row.get("id")?,
        user_name: row.get("userName")?,
        is_active: parse_flag(row.get("isActive")?)?,
    })
}

fn parse_flag(value: i64) -> DaoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(DaoError::InvalidData(format!(
            "invalid isActive value `{other}` in users.isActive"
        ))),
    }
}

fn id_prefix(id: &str) -> String {
    id.chars().take(LOGGED_ID_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::{id_prefix, parse_flag, DaoError};

    #[test]
    fn parse_flag_accepts_only_zero_and_one() {
        assert!(!parse_flag(0).unwrap());
        assert!(parse_flag(1).unwrap());
        assert!(matches!(parse_flag(2), Err(DaoError::InvalidData(_))));
    }

    #[test]
    fn id_prefix_truncates_long_ids() {
        assert_eq!(id_prefix("0123456789abcdef"), "01234567");
        assert_eq!(id_prefix("id"), "id");
    }
}
