//! Durable stores for tasks and the theme preference.
//!
//! # Responsibility
//! - Own the SQLite tables and keep SQL inside the persistence boundary.
//! - Publish a full task snapshot after every task mutation.
//!
//! # Invariants
//! - Task mutations are serialized per store instance.
//! - A snapshot is published only after its mutation committed.
//! - Removing or updating a missing task is a no-op, not an error.

use crate::db::DbError;
use crate::model::task::{Task, TaskId};
use crate::model::theme::ThemePreference;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use tokio::sync::watch;

mod preference_store;
mod task_store;

pub use preference_store::{SqlitePreferenceStore, THEME_KEY};
pub use task_store::SqliteTaskStore;

pub type StoreResult<T> = Result<T, StorageFault>;

/// Live view of the full task list; the current value is always the latest
/// committed snapshot.
pub type TaskSubscription = watch::Receiver<Vec<Task>>;

/// Durable medium failure surfaced by either store.
#[derive(Debug)]
pub enum StorageFault {
    Db(DbError),
    /// The connection was not migrated to the schema this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// A previous writer panicked while holding the connection.
    LockPoisoned,
    /// The blocking write was cancelled or the writer went away.
    Interrupted(String),
    InvalidData(String),
}

impl Display for StorageFault {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::LockPoisoned => write!(f, "store connection lock poisoned"),
            Self::Interrupted(message) => write!(f, "store write interrupted: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for StorageFault {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. }
            | Self::LockPoisoned
            | Self::Interrupted(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StorageFault {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageFault {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable, observable collection of tasks.
///
/// Implementations are cheap handles (`Clone`) onto one underlying store so
/// the repository and the controller's writer task can share it.
pub trait TaskStore: Clone + Send + Sync + 'static {
    /// Inserts a task with a store-assigned id.
    fn create(&self, description: String) -> impl Future<Output = StoreResult<Task>> + Send;

    /// Deletes the task with `id`. Missing ids succeed.
    fn remove(&self, id: TaskId) -> impl Future<Output = StoreResult<()>> + Send;

    /// Sets the completion flag of `id`. Missing ids succeed.
    fn set_complete(
        &self,
        id: TaskId,
        complete: bool,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Subscribes to full-list snapshots, ordered by insertion.
    fn list_all(&self) -> TaskSubscription;
}

/// Single-key persistence for the theme preference.
pub trait PreferenceStore: Send + Sync + 'static {
    /// Returns the persisted theme, `System` when none was written yet.
    fn get(&self) -> StoreResult<ThemePreference>;

    /// Overwrites the persisted theme. Durable once this returns.
    fn set(&self, value: ThemePreference) -> StoreResult<()>;
}

fn ensure_schema_ready(conn: &rusqlite::Connection) -> StoreResult<()> {
    let expected_version = crate::db::migrations::latest_version();
    let actual_version: u32 =
        conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StorageFault::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
