//! Core domain logic for the todolist app.
//! This crate is the single source of truth for task and preference invariants.

pub mod app;
pub mod controller;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;

pub use app::TodoApp;
pub use controller::task_list::{PendingWrite, TaskListController, TaskListState};
pub use controller::theme::ThemeController;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{Task, TaskId};
pub use model::theme::ThemePreference;
pub use repo::task_repo::TaskRepository;
pub use store::{
    PreferenceStore, SqlitePreferenceStore, SqliteTaskStore, StorageFault, StoreResult,
    TaskStore, TaskSubscription,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
