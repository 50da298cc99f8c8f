//! SQLite-backed task store.
//!
//! # Invariants
//! - The connection mutex is the single write lock for this store.
//! - Each mutation and the snapshot read that follows it share one
//!   transaction; the snapshot is published before the lock is released.
//! - Snapshot order is `id ASC`, which is insertion order because ids come
//!   from `AUTOINCREMENT`.

use super::{ensure_schema_ready, StorageFault, StoreResult, TaskStore, TaskSubscription};
use crate::db::{open_db, open_db_in_memory};
use crate::model::task::{Task, TaskId};
use log::{debug, error, info};
use rusqlite::{params, Connection, Row};
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::watch;

const TASK_SELECT_ALL_SQL: &str = "SELECT id, description, complete FROM tasks ORDER BY id ASC;";

/// Handle onto one SQLite task table and its snapshot publisher.
///
/// Clones share the same connection and publisher. Build exactly one per
/// database file and pass clones around.
#[derive(Clone)]
pub struct SqliteTaskStore {
    inner: Arc<Inner>,
}

struct Inner {
    conn: Mutex<Connection>,
    snapshots: watch::Sender<Vec<Task>>,
}

impl SqliteTaskStore {
    /// Wraps a migrated connection and seeds the snapshot from disk.
    ///
    /// # Errors
    /// - `UninitializedConnection` if migrations were not applied.
    /// - `Db`/`InvalidData` if the existing rows cannot be read.
    pub fn new(conn: Connection) -> StoreResult<Self> {
        ensure_schema_ready(&conn)?;
        let initial = load_all(&conn)?;
        info!(
            "event=task_store_open module=store status=ok task_count={}",
            initial.len()
        );

        let (snapshots, _) = watch::channel(initial);
        Ok(Self {
            inner: Arc::new(Inner {
                conn: Mutex::new(conn),
                snapshots,
            }),
        })
    }

    /// Opens the database file at `path` and builds a store over it.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::new(open_db(path)?)
    }

    /// Builds a store over a fresh in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::new(open_db_in_memory()?)
    }

    /// Returns the most recently published snapshot.
    pub fn snapshot(&self) -> Vec<Task> {
        self.inner.snapshots.borrow().clone()
    }

    fn write<T, F>(
        &self,
        op: &'static str,
        mutate: F,
    ) -> impl Future<Output = StoreResult<T>> + Send
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        async move {
            let started_at = Instant::now();
            let result = tokio::task::spawn_blocking(move || inner.apply(mutate))
                .await
                .map_err(|err| StorageFault::Interrupted(format!("task join error: {err}")))
                .and_then(|result| result);

            match &result {
                Ok(_) => debug!(
                    "event=task_write module=store status=ok op={} duration_ms={}",
                    op,
                    started_at.elapsed().as_millis()
                ),
                Err(err) => error!(
                    "event=task_write module=store status=error op={} duration_ms={} error={}",
                    op,
                    started_at.elapsed().as_millis(),
                    err
                ),
            }
            result
        }
    }
}

impl Inner {
    fn apply<T>(&self, mutate: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let conn = self.conn.lock().map_err(|_| StorageFault::LockPoisoned)?;

        let tx = conn.unchecked_transaction()?;
        let output = mutate(&*tx)?;
        let snapshot = load_all(&tx)?;
        tx.commit()?;

        self.snapshots.send_replace(snapshot);
        Ok(output)
    }
}

impl TaskStore for SqliteTaskStore {
    fn create(&self, description: String) -> impl Future<Output = StoreResult<Task>> + Send {
        self.write("create", move |conn| {
            conn.execute(
                "INSERT INTO tasks (description, complete) VALUES (?1, 0);",
                params![description.as_str()],
            )?;
            Ok(Task {
                id: TaskId::from_raw(conn.last_insert_rowid()),
                description,
                complete: false,
            })
        })
    }

    fn remove(&self, id: TaskId) -> impl Future<Output = StoreResult<()>> + Send {
        self.write("remove", move |conn| {
            let changed = conn.execute("DELETE FROM tasks WHERE id = ?1;", params![id.get()])?;
            if changed == 0 {
                debug!("event=task_remove module=store status=skip reason=not_found task_id={id}");
            }
            Ok(())
        })
    }

    fn set_complete(
        &self,
        id: TaskId,
        complete: bool,
    ) -> impl Future<Output = StoreResult<()>> + Send {
        self.write("set_complete", move |conn| {
            let changed = conn.execute(
                "UPDATE tasks SET complete = ?2 WHERE id = ?1;",
                params![id.get(), i64::from(complete)],
            )?;
            if changed == 0 {
                debug!(
                    "event=task_set_complete module=store status=skip reason=not_found task_id={id}"
                );
            }
            Ok(())
        })
    }

    fn list_all(&self) -> TaskSubscription {
        self.inner.snapshots.subscribe()
    }
}

fn load_all(conn: &Connection) -> StoreResult<Vec<Task>> {
    let mut stmt = conn.prepare(TASK_SELECT_ALL_SQL)?;
    let mut rows = stmt.query([])?;
    let mut tasks = Vec::new();

    while let Some(row) = rows.next()? {
        tasks.push(parse_task_row(row)?);
    }

    Ok(tasks)
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<Task> {
    let id = TaskId::from_raw(row.get("id")?);
    let complete = match row.get::<_, i64>("complete")? {
        0 => false,
        1 => true,
        other => {
            return Err(StorageFault::InvalidData(format!(
                "invalid complete value `{other}` in tasks.complete for task {id}"
            )));
        }
    };

    Ok(Task {
        id,
        description: row.get("description")?,
        complete,
    })
}

#[cfg(test)]
mod tests {
    use super::SqliteTaskStore;
    use crate::store::{StorageFault, TaskStore};
    use rusqlite::Connection;

    #[tokio::test]
    async fn snapshot_is_published_before_write_returns() {
        let store = SqliteTaskStore::open_in_memory().unwrap();
        let subscription = store.list_all();

        let task = store.create("first".to_string()).await.unwrap();

        assert_eq!(*subscription.borrow(), vec![task.clone()]);
        assert_eq!(store.snapshot(), vec![task]);
    }

    #[test]
    fn new_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();

        match SqliteTaskStore::new(conn) {
            Err(StorageFault::UninitializedConnection {
                expected_version,
                actual_version: 0,
            }) => assert!(expected_version > 0),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected uninitialized connection error"),
        }
    }

    #[test]
    fn new_rejects_corrupt_completion_flag() {
        let conn = crate::db::open_db_in_memory().unwrap();
        conn.execute_batch(
            "DROP TABLE tasks;
             CREATE TABLE tasks (id INTEGER PRIMARY KEY, description TEXT, complete INTEGER);
             INSERT INTO tasks (id, description, complete) VALUES (1, 'odd', 5);",
        )
        .unwrap();

        let err = SqliteTaskStore::new(conn).err().unwrap();
        assert!(matches!(err, StorageFault::InvalidData(_)), "{err}");
    }
}
