use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use todolist_core::{
    SqliteTaskStore, StorageFault, StoreResult, Task, TaskId, TaskListController,
    TaskListState, TaskRepository, TaskStore, TaskSubscription, TodoApp,
};

const WAIT_LIMIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn add_then_delete_round_trips_through_the_observable() {
    let store = SqliteTaskStore::open_in_memory().unwrap();
    let controller = TaskListController::new(TaskRepository::new(store), &Handle::current());
    let mut states = controller.subscribe();

    let ready = wait_for(&mut states, TaskListState::is_ready).await;
    assert!(ready.tasks().is_empty());

    controller
        .submit_new_task("Buy milk")
        .expect("non-blank input is accepted")
        .wait()
        .await
        .unwrap();
    let with_task = wait_for(&mut states, |state| state.tasks().len() == 1).await;
    let task = with_task.tasks()[0].clone();
    assert_eq!(task.description, "Buy milk");
    assert!(!task.complete);

    controller.submit_delete(&task).wait().await.unwrap();
    let emptied = wait_for(&mut states, |state| state.tasks().is_empty()).await;
    assert!(emptied.is_ready());
}

#[tokio::test]
async fn blank_submissions_are_dropped_without_touching_the_store() {
    let store = SqliteTaskStore::open_in_memory().unwrap();
    let mut store_updates = store.list_all();
    store_updates.borrow_and_update();
    let controller =
        TaskListController::new(TaskRepository::new(store.clone()), &Handle::current());
    let mut states = controller.subscribe();
    wait_for(&mut states, TaskListState::is_ready).await;
    states.borrow_and_update();

    assert!(controller.submit_new_task("").is_none());
    assert!(controller.submit_new_task("   ").is_none());
    assert!(controller.submit_new_task("\t\n").is_none());
    tokio::task::yield_now().await;

    assert!(!store_updates.has_changed().unwrap());
    assert!(!states.has_changed().unwrap());
    assert!(store.snapshot().is_empty());

    controller
        .submit_new_task("real")
        .unwrap()
        .wait()
        .await
        .unwrap();
    let descriptions: Vec<_> = store
        .snapshot()
        .into_iter()
        .map(|task| task.description)
        .collect();
    assert_eq!(descriptions, ["real"]);
}

#[tokio::test]
async fn descriptions_are_stored_verbatim() {
    let store = SqliteTaskStore::open_in_memory().unwrap();
    let controller =
        TaskListController::new(TaskRepository::new(store.clone()), &Handle::current());

    controller
        .submit_new_task("  padded  ")
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(store.snapshot()[0].description, "  padded  ");
}

#[tokio::test]
async fn submissions_apply_in_order() {
    let store = SqliteTaskStore::open_in_memory().unwrap();
    let controller =
        TaskListController::new(TaskRepository::new(store.clone()), &Handle::current());

    let pending: Vec<_> = ["one", "two", "three", "four"]
        .into_iter()
        .filter_map(|text| controller.submit_new_task(text))
        .collect();
    for write in pending {
        write.wait().await.unwrap();
    }

    let descriptions: Vec<_> = store
        .snapshot()
        .into_iter()
        .map(|task| task.description)
        .collect();
    assert_eq!(descriptions, ["one", "two", "three", "four"]);
}

#[tokio::test]
async fn toggle_flips_completion_from_rendered_state() {
    let store = SqliteTaskStore::open_in_memory().unwrap();
    let controller = TaskListController::new(TaskRepository::new(store), &Handle::current());
    let mut states = controller.subscribe();

    controller.submit_new_task("call mom").unwrap().wait().await.unwrap();
    let task = wait_for(&mut states, |state| state.tasks().len() == 1).await.tasks()[0].clone();

    controller.submit_toggle(&task).wait().await.unwrap();
    let toggled = wait_for(&mut states, |state| {
        state.tasks().first().is_some_and(|task| task.complete)
    })
    .await;
    let expected = Task {
        complete: true,
        ..task.clone()
    };
    assert_eq!(toggled.tasks(), &[expected]);

    controller.submit_toggle(&toggled.tasks()[0]).wait().await.unwrap();
    wait_for(&mut states, |state| {
        state.tasks().first().is_some_and(|task| !task.complete)
    })
    .await;
}

#[tokio::test]
async fn repeated_set_complete_keeps_the_requested_value() {
    let store = SqliteTaskStore::open_in_memory().unwrap();
    let controller =
        TaskListController::new(TaskRepository::new(store.clone()), &Handle::current());
    let task = store.create("double tap".to_string()).await.unwrap();

    let first = controller.submit_set_complete(&task, true);
    let second = controller.submit_set_complete(&task, true);
    first.wait().await.unwrap();
    second.wait().await.unwrap();
    assert!(store.snapshot()[0].complete);

    controller.submit_set_complete(&task, false).wait().await.unwrap();
    assert!(!store.snapshot()[0].complete);
}

#[tokio::test]
async fn delete_reaches_tasks_the_controller_has_not_rendered_yet() {
    let store = SqliteTaskStore::open_in_memory().unwrap();
    let controller =
        TaskListController::new(TaskRepository::new(store.clone()), &Handle::current());
    let fresh = store.create("just committed".to_string()).await.unwrap();
    let by_id = Task {
        id: fresh.id,
        description: String::new(),
        complete: false,
    };

    controller.submit_delete(&by_id).wait().await.unwrap();

    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn deleting_a_stale_task_is_a_no_op() {
    let store = SqliteTaskStore::open_in_memory().unwrap();
    let controller =
        TaskListController::new(TaskRepository::new(store.clone()), &Handle::current());
    let ghost = Task {
        id: TaskId::from_raw(77),
        description: "already gone".to_string(),
        complete: false,
    };

    controller.submit_delete(&ghost).wait().await.unwrap();
    controller.submit_delete(&ghost).wait().await.unwrap();

    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn queued_writes_finish_after_the_controller_is_dropped() {
    let store = SqliteTaskStore::open_in_memory().unwrap();
    let mut store_updates = store.list_all();
    let controller =
        TaskListController::new(TaskRepository::new(store.clone()), &Handle::current());

    for text in ["a", "b", "c"] {
        let _fire_and_forget = controller.submit_new_task(text);
    }
    drop(controller);

    let landed = tokio::time::timeout(WAIT_LIMIT, store_updates.wait_for(|tasks| tasks.len() == 3))
        .await
        .expect("queued writes should land")
        .unwrap()
        .clone();
    assert_eq!(landed.len(), 3);
}

#[tokio::test]
async fn storage_fault_keeps_last_good_snapshot() {
    let store = FlakyStore::new();
    let controller =
        TaskListController::new(TaskRepository::new(store.clone()), &Handle::current());
    let mut states = controller.subscribe();

    controller.submit_new_task("saved").unwrap().wait().await.unwrap();
    let before = wait_for(&mut states, |state| state.tasks().len() == 1).await;

    store.fail_writes(true);
    let err = controller
        .submit_new_task("lost")
        .unwrap()
        .wait()
        .await
        .unwrap_err();
    assert!(matches!(err, StorageFault::InvalidData(_)), "{err}");
    let delete_err = controller
        .submit_delete(&before.tasks()[0])
        .wait()
        .await
        .unwrap_err();
    assert!(matches!(delete_err, StorageFault::InvalidData(_)));

    assert_eq!(controller.state(), before);
    assert_eq!(controller.tasks(), before.tasks());

    store.fail_writes(false);
    controller.submit_new_task("recovered").unwrap().wait().await.unwrap();
    wait_for(&mut states, |state| state.tasks().len() == 2).await;
}

#[tokio::test]
async fn app_wires_tasks_and_theme_over_one_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("todolist.sqlite3");

    let app = TodoApp::open(&path, &Handle::current()).unwrap();
    assert_eq!(app.db_path(), Some(path.as_path()));
    let mut states = app.tasks().subscribe();
    app.tasks()
        .submit_new_task("Buy milk")
        .unwrap()
        .wait()
        .await
        .unwrap();
    wait_for(&mut states, |state| state.tasks().len() == 1).await;
    app.theme()
        .change_theme(todolist_core::ThemePreference::Dark)
        .unwrap();
    drop(states);
    drop(app);

    let reopened = TodoApp::open(&path, &Handle::current()).unwrap();
    let mut states = reopened.tasks().subscribe();
    let restored = wait_for(&mut states, TaskListState::is_ready).await;
    assert_eq!(restored.tasks().len(), 1);
    assert_eq!(restored.tasks()[0].description, "Buy milk");
    assert_eq!(
        reopened.theme().current(),
        todolist_core::ThemePreference::Dark
    );
}

async fn wait_for(
    states: &mut watch::Receiver<TaskListState>,
    predicate: impl FnMut(&TaskListState) -> bool,
) -> TaskListState {
    tokio::time::timeout(WAIT_LIMIT, states.wait_for(predicate))
        .await
        .expect("state did not arrive in time")
        .expect("controller state channel closed")
        .clone()
}

/// Task store whose writes can be switched to fail.
#[derive(Clone)]
struct FlakyStore {
    inner: SqliteTaskStore,
    failing: Arc<AtomicBool>,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: SqliteTaskStore::open_in_memory().unwrap(),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageFault::InvalidData("disk full".to_string()));
        }
        Ok(())
    }
}

impl TaskStore for FlakyStore {
    fn create(&self, description: String) -> impl Future<Output = StoreResult<Task>> + Send {
        let gate = self.check();
        let inner = self.inner.clone();
        async move {
            gate?;
            inner.create(description).await
        }
    }

    fn remove(&self, id: TaskId) -> impl Future<Output = StoreResult<()>> + Send {
        let gate = self.check();
        let inner = self.inner.clone();
        async move {
            gate?;
            inner.remove(id).await
        }
    }

    fn set_complete(
        &self,
        id: TaskId,
        complete: bool,
    ) -> impl Future<Output = StoreResult<()>> + Send {
        let gate = self.check();
        let inner = self.inner.clone();
        async move {
            gate?;
            inner.set_complete(id, complete).await
        }
    }

    fn list_all(&self) -> TaskSubscription {
        self.inner.list_all()
    }
}
