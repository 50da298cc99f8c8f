//! Composition root.
//!
//! # Responsibility
//! - Build exactly one task store and one preference store per database.
//! - Wire the repository and controllers the UI talks to.
//!
//! # Invariants
//! - The core keeps no global instance; hosts own the `TodoApp` they build.

use crate::controller::task_list::TaskListController;
use crate::controller::theme::ThemeController;
use crate::repo::task_repo::TaskRepository;
use crate::store::{SqlitePreferenceStore, SqliteTaskStore, StoreResult};
use log::info;
use std::path::{Path, PathBuf};
use tokio::runtime::Handle;

/// Application core for one process.
pub struct TodoApp {
    db_path: Option<PathBuf>,
    tasks: TaskListController,
    theme: ThemeController<SqlitePreferenceStore>,
}

impl TodoApp {
    /// Opens the database at `db_path` and starts the task controller on
    /// `runtime`.
    ///
    /// The task store and preference store each own a separate connection to
    /// the same file.
    pub fn open(db_path: impl AsRef<Path>, runtime: &Handle) -> StoreResult<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        let task_store = SqliteTaskStore::open(&db_path)?;
        let preference_store = SqlitePreferenceStore::open(&db_path)?;
        info!(
            "event=app_open module=app status=ok mode=file db_path={}",
            db_path.display()
        );
        Ok(Self::assemble(
            Some(db_path),
            task_store,
            preference_store,
            runtime,
        ))
    }

    /// Builds an app over private in-memory databases.
    pub fn open_in_memory(runtime: &Handle) -> StoreResult<Self> {
        let task_store = SqliteTaskStore::open_in_memory()?;
        let preference_store = SqlitePreferenceStore::open_in_memory()?;
        info!("event=app_open module=app status=ok mode=memory");
        Ok(Self::assemble(None, task_store, preference_store, runtime))
    }

    fn assemble(
        db_path: Option<PathBuf>,
        task_store: SqliteTaskStore,
        preference_store: SqlitePreferenceStore,
        runtime: &Handle,
    ) -> Self {
        Self {
            db_path,
            tasks: TaskListController::new(TaskRepository::new(task_store), runtime),
            theme: ThemeController::new(preference_store),
        }
    }

    /// Database file backing this app; `None` for in-memory apps.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn tasks(&self) -> &TaskListController {
        &self.tasks
    }

    pub fn theme(&self) -> &ThemeController<SqlitePreferenceStore> {
        &self.theme
    }
}
