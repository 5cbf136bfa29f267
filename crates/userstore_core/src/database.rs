//! Owned database handle with async, single-shot DAO calls.
//!
//! # Responsibility
//! - Own one migrated connection and share it between DAO handles.
//! - Run each DAO call as one blocking unit of work off the async executor.
//!
//! # Invariants
//! - All access to the connection goes through one mutex.
//! - Each future resolves exactly once; nothing is pushed after it completes.
//! - Dropping a future does not abort SQL already running on the blocking pool.
//! - A failed `close` hands the database back to the caller.
//!
//! # See also
//! - DESIGN.md (async model decision)

use crate::dao::user_dao::{DaoError, DaoResult, SqliteUserDao, UserDao};
use crate::db::{open_db, open_db_in_memory};
use crate::model::user::User;
use log::{error, info, warn};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// Shared handle to the users database.
#[derive(Debug)]
pub struct UsersDatabase {
    // Why: `rusqlite::Connection` is `Send` but not `Sync`, so sharing it
    // between handles needs a lock; `std::sync::Mutex` is enough because the
    // guard is only held on a blocking thread, never across an `.await`.
    conn: Arc<Mutex<Connection>>,
}

impl UsersDatabase {
    /// Opens a private in-memory database. Its rows disappear on close.
    pub fn in_memory() -> DaoResult<Self> {
        Self::from_connection(open_db_in_memory()?)
    }

    /// Opens or creates the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> DaoResult<Self> {
        Self::from_connection(open_db(path)?)
    }

    /// Adopts an already opened connection after checking its schema.
    pub fn from_connection(conn: Connection) -> DaoResult<Self> {
        SqliteUserDao::try_new(&conn)?;
        Ok(Self::wrap(conn))
    }

    /// Returns a cloneable DAO handle bound to this database.
    pub fn user_dao(&self) -> UserDaoHandle {
        UserDaoHandle {
            conn: Arc::clone(&self.conn),
        }
    }

    /// Closes the underlying connection.
    ///
    /// On failure the database is returned with the error, mirroring
    /// `rusqlite::Connection::close`, so the caller can retry.
    ///
    /// # Errors
    /// - `DaoError::DatabaseInUse` while any `UserDaoHandle` is still alive.
    /// - `DaoError::Db` when SQLite refuses to close the connection.
    pub fn close(self) -> Result<(), (Self, DaoError)> {
        let mutex = match Arc::try_unwrap(self.conn) {
            Ok(mutex) => mutex,
            Err(conn) => {
                warn!("event=db_close module=database status=error error_code=db_in_use");
                return Err((Self { conn }, DaoError::DatabaseInUse));
            }
        };

        // A panicked task cannot leave SQLite mid-statement; closing is still safe.
        let conn = mutex.into_inner().unwrap_or_else(PoisonError::into_inner);
        match conn.close() {
            Ok(()) => {
                info!("event=db_close module=database status=ok");
                Ok(())
            }
            Err((conn, err)) => {
                error!("event=db_close module=database status=error error={err}");
                Err((Self::wrap(conn), DaoError::from(err)))
            }
        }
    }

    fn wrap(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

/// Async mirror of [`UserDao`].
///
/// Every method is a single-shot computation answering at most once.
#[derive(Debug, Clone)]
pub struct UserDaoHandle {
    conn: Arc<Mutex<Connection>>,
}

impl UserDaoHandle {
    pub async fn insert_user(&self, user: User) -> DaoResult<()> {
        self.run("insert_user", move |dao| dao.insert_user(&user)).await
    }

    /// Resolves to `None` when no row has `id`.
    pub async fn get_user_by_id(&self, id: impl Into<String>) -> DaoResult<Option<User>> {
        let id = id.into();
        self.run("get_user_by_id", move |dao| dao.get_user_by_id(&id))
            .await
    }

    /// Fails with `DaoError::NotFound` when no row has `id`.
    pub async fn is_user_active(&self, id: impl Into<String>) -> DaoResult<bool> {
        let id = id.into();
        self.run("is_user_active", move |dao| dao.is_user_active(&id))
            .await
    }

    pub async fn delete_all_users(&self) -> DaoResult<()> {
        self.run("delete_all_users", |dao| dao.delete_all_users()).await
    }

    pub async fn count_users(&self) -> DaoResult<u64> {
        self.run("count_users", |dao| dao.count_users()).await
    }

    async fn run<T, F>(&self, operation: &'static str, work: F) -> DaoResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteUserDao<'_>) -> DaoResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        // Why: every rusqlite call blocks; running it on tokio's blocking pool
        // keeps executor threads free while SQLite waits on its busy timeout.
        let joined = tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| DaoError::ConnectionPoisoned)?;
            let dao = SqliteUserDao::from_checked(&guard);
            work(&dao)
        })
        .await;

        match joined {
            Ok(result) => result,
            Err(err) => {
                error!(
                    "event=dao_task module=database status=error operation={operation} error={err}"
                );
                Err(DaoError::TaskFailed(format!("{operation}: {err}")))
            }
        }
    }
}
