//! FFI use-case API for the Flutter UI.
//!
//! # Responsibility
//! - Expose the task list and theme intents as sync, plain-data calls.
//! - Own the process-wide runtime and `TodoApp` instance.
//!
//! # Invariants
//! - Exported functions never panic across the FFI boundary.
//! - Exactly one `TodoApp` (one store per kind) exists per process.
//! - Task mutations are fire-and-forget; the UI re-reads `task_list`.

use log::warn;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use todolist_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Task, TaskId, ThemePreference, TodoApp,
};
use tokio::runtime::Runtime;

const DEFAULT_DB_FILE_NAME: &str = "todolist.sqlite3";
const DB_PATH_ENV: &str = "TODOLIST_DB_PATH";
const RUNTIME_WORKER_THREADS: usize = 2;

static RUNTIME: OnceLock<Result<Runtime, String>> = OnceLock::new();
static APP: OnceLock<TodoApp> = OnceLock::new();
static APP_INIT: Mutex<()> = Mutex::new(());

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Core crate version.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes core logging once per process.
///
/// - `level`: `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory for rolling log files.
///
/// Returns an empty string on success and the error message otherwise.
/// Repeating the same call is a no-op; a different level or dir is rejected.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Opens the app database at `db_path`.
///
/// Call before any task/theme function to choose where data lives. Returns
/// an empty string on success. Calling again with the same path is a no-op;
/// a different path is rejected because the process already owns a store.
#[flutter_rust_bridge::frb(sync)]
pub fn app_open(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }

    match app_with_path(PathBuf::from(trimmed)) {
        Ok(app) if app.db_path() == Some(Path::new(trimmed)) => String::new(),
        Ok(app) => format!(
            "app already opened at `{}`; refusing to switch to `{trimmed}`",
            app.db_path()
                .map(|path| path.display().to_string())
                .unwrap_or_default()
        ),
        Err(err) => err,
    }
}

/// Database path of the open app, opening the default one if needed.
#[flutter_rust_bridge::frb(sync)]
pub fn app_db_path() -> String {
    match app() {
        Ok(app) => app
            .db_path()
            .map(|path| path.display().to_string())
            .unwrap_or_default(),
        Err(err) => {
            warn!("event=ffi_app_db_path module=ffi status=error error={err}");
            String::new()
        }
    }
}

/// One rendered task row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: i64,
    pub description: String,
    pub complete: bool,
}

/// Snapshot of the task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    /// False until the first snapshot reached the controller.
    pub ready: bool,
    pub items: Vec<TaskItem>,
    /// Diagnostics; empty on success.
    pub message: String,
}

/// Result envelope for task intents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    pub ok: bool,
    /// Whether a write was queued. Blank adds are ignored with
    /// `accepted = false`.
    pub accepted: bool,
    pub message: String,
}

impl TaskActionResponse {
    fn queued(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            accepted: true,
            message: message.into(),
        }
    }

    fn skipped(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            accepted: false,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            accepted: false,
            message: message.into(),
        }
    }
}

/// Result envelope for theme changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeResponse {
    pub ok: bool,
    /// Active theme after the call (`LIGHT|DARK|SYSTEM`).
    pub theme: String,
    pub message: String,
}

/// Returns the latest task list state.
#[flutter_rust_bridge::frb(sync)]
pub fn task_list() -> TaskListResponse {
    match app() {
        Ok(app) => {
            let state = app.tasks().state();
            TaskListResponse {
                ready: state.is_ready(),
                items: state.tasks().iter().map(to_task_item).collect(),
                message: String::new(),
            }
        }
        Err(err) => TaskListResponse {
            ready: false,
            items: Vec::new(),
            message: format!("task_list failed: {err}"),
        },
    }
}

/// Queues a new task. Blank input is ignored.
#[flutter_rust_bridge::frb(sync)]
pub fn task_add(description: String) -> TaskActionResponse {
    let app = match app() {
        Ok(app) => app,
        Err(err) => return TaskActionResponse::failure(format!("task_add failed: {err}")),
    };

    match app.tasks().submit_new_task(&description) {
        Some(_pending) => TaskActionResponse::queued("Task queued."),
        None => TaskActionResponse::skipped("Blank task ignored."),
    }
}

/// Queues deletion of the task with `id`.
///
/// Always forwarded: the id may belong to a task that is committed but not
/// yet visible in `task_list`. Unknown ids are a no-op in the store.
#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(id: i64) -> TaskActionResponse {
    let app = match app() {
        Ok(app) => app,
        Err(err) => return TaskActionResponse::failure(format!("task_delete failed: {err}")),
    };

    let _pending = app.tasks().submit_delete(&task_key(id));
    TaskActionResponse::queued("Task delete queued.")
}

/// Queues `complete` as the completion flag of the task with `id`.
///
/// The host passes the checkbox's new value, so repeated taps never cancel
/// each other out. Unknown ids are a no-op in the store.
#[flutter_rust_bridge::frb(sync)]
pub fn task_set_complete(id: i64, complete: bool) -> TaskActionResponse {
    let app = match app() {
        Ok(app) => app,
        Err(err) => {
            return TaskActionResponse::failure(format!("task_set_complete failed: {err}"));
        }
    };

    let _pending = app.tasks().submit_set_complete(&task_key(id), complete);
    TaskActionResponse::queued("Task completion queued.")
}

/// Returns the active theme token, `SYSTEM` if the app cannot be opened.
#[flutter_rust_bridge::frb(sync)]
pub fn theme_get() -> String {
    match app() {
        Ok(app) => app.theme().current().as_str().to_string(),
        Err(err) => {
            warn!("event=ffi_theme_get module=ffi status=fallback value=SYSTEM error={err}");
            ThemePreference::default().as_str().to_string()
        }
    }
}

/// Whether the dark palette applies, given the OS dark-mode setting.
#[flutter_rust_bridge::frb(sync)]
pub fn theme_is_dark(system_is_dark: bool) -> bool {
    let theme = match app() {
        Ok(app) => app.theme().current(),
        Err(err) => {
            warn!("event=ffi_theme_is_dark module=ffi status=fallback value=SYSTEM error={err}");
            ThemePreference::default()
        }
    };
    theme.resolve_dark(system_is_dark)
}

/// Persists and activates a theme (`LIGHT|DARK|SYSTEM`, `AUTO` accepted).
#[flutter_rust_bridge::frb(sync)]
pub fn theme_set(value: String) -> ThemeResponse {
    let app = match app() {
        Ok(app) => app,
        Err(err) => {
            return ThemeResponse {
                ok: false,
                theme: ThemePreference::default().as_str().to_string(),
                message: format!("theme_set failed: {err}"),
            };
        }
    };

    let Some(requested) = ThemePreference::parse(&value) else {
        return ThemeResponse {
            ok: false,
            theme: app.theme().current().as_str().to_string(),
            message: format!("theme_set failed: unsupported theme `{}`", value.trim()),
        };
    };

    let result = app.theme().change_theme(requested);
    ThemeResponse {
        ok: result.is_ok(),
        theme: app.theme().current().as_str().to_string(),
        message: result
            .err()
            .map(|err| format!("theme_set failed: {err}"))
            .unwrap_or_default(),
    }
}

fn app() -> Result<&'static TodoApp, String> {
    match APP.get() {
        Some(app) => Ok(app),
        None => app_with_path(resolve_default_db_path()),
    }
}

fn app_with_path(db_path: PathBuf) -> Result<&'static TodoApp, String> {
    if let Some(app) = APP.get() {
        return Ok(app);
    }

    let _guard = APP_INIT
        .lock()
        .map_err(|_| "app init lock poisoned".to_string())?;
    if let Some(app) = APP.get() {
        return Ok(app);
    }

    let runtime = runtime()?;
    let app = TodoApp::open(&db_path, runtime.handle())
        .map_err(|err| format!("app open failed: {err}"))?;
    Ok(APP.get_or_init(|| app))
}

fn runtime() -> Result<&'static Runtime, String> {
    RUNTIME
        .get_or_init(|| {
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(RUNTIME_WORKER_THREADS)
                .thread_name("todolist-core")
                .enable_all()
                .build()
                .map_err(|err| format!("runtime start failed: {err}"))
        })
        .as_ref()
        .map_err(Clone::clone)
}

fn resolve_default_db_path() -> PathBuf {
    if let Ok(raw) = std::env::var(DB_PATH_ENV) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)
}

// Store mutations only read the id of the task they target.
fn task_key(id: i64) -> Task {
    Task {
        id: TaskId::from_raw(id),
        description: String::new(),
        complete: false,
    }
}

fn to_task_item(task: &Task) -> TaskItem {
    TaskItem {
        id: task.id.get(),
        description: task.description.clone(),
        complete: task.complete,
    }
}
