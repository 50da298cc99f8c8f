//! Task list controller.
//!
//! Two background tasks run per controller:
//! - a forwarder republishing every store snapshot as [`TaskListState::Ready`];
//! - a single writer draining submitted commands in submission order.
//!
//! Dropping the controller stops the forwarder only. The writer finishes
//! whatever is already queued and then exits, so a submitted task is not lost
//! when the UI session goes away.

use crate::model::task::{is_blank_description, Task};
use crate::repo::task_repo::TaskRepository;
use crate::store::{StorageFault, StoreResult, TaskStore, TaskSubscription};
use log::{debug, error, info};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// Presentation-facing view of the task list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TaskListState {
    /// No snapshot has arrived from the store yet. Renders as empty.
    #[default]
    Uninitialized,
    /// Latest full snapshot.
    Ready(Vec<Task>),
}

impl TaskListState {
    pub fn tasks(&self) -> &[Task] {
        match self {
            Self::Uninitialized => &[],
            Self::Ready(tasks) => tasks,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Completion handle for one submitted mutation.
///
/// Dropping it does not cancel the write.
#[derive(Debug)]
pub struct PendingWrite {
    ack: oneshot::Receiver<StoreResult<()>>,
}

impl PendingWrite {
    /// Waits until the writer has applied (or failed) this mutation.
    pub async fn wait(self) -> StoreResult<()> {
        self.ack.await.unwrap_or_else(|_| {
            Err(StorageFault::Interrupted(
                "task writer stopped before acknowledging".to_string(),
            ))
        })
    }
}

enum Command {
    Add { description: String },
    Delete { task: Task },
    SetComplete { task: Task, complete: bool },
}

impl Command {
    fn label(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Delete { .. } => "delete",
            Self::SetComplete { .. } => "set_complete",
        }
    }
}

struct Envelope {
    command: Command,
    ack: oneshot::Sender<StoreResult<()>>,
}

/// Owns the observable task list for one UI session.
pub struct TaskListController {
    state: watch::Receiver<TaskListState>,
    commands: mpsc::UnboundedSender<Envelope>,
    forwarder: JoinHandle<()>,
}

impl TaskListController {
    /// Subscribes to `repo` and starts the forwarder and writer on `runtime`.
    pub fn new<S: TaskStore>(repo: TaskRepository<S>, runtime: &Handle) -> Self {
        let (state_tx, state) = watch::channel(TaskListState::Uninitialized);
        let forwarder = runtime.spawn(forward_snapshots(repo.observe_all(), state_tx));

        let (commands, queue) = mpsc::unbounded_channel();
        runtime.spawn(drain_commands(repo, queue));

        Self {
            state,
            commands,
            forwarder,
        }
    }

    /// Returns a receiver tracking every state the controller publishes.
    pub fn subscribe(&self) -> watch::Receiver<TaskListState> {
        self.state.clone()
    }

    pub fn state(&self) -> TaskListState {
        self.state.borrow().clone()
    }

    /// Tasks of the latest state; empty before the first snapshot.
    pub fn tasks(&self) -> Vec<Task> {
        self.state.borrow().tasks().to_vec()
    }

    /// Queues a new task.
    ///
    /// Blank or whitespace-only input is dropped: `None` is returned and the
    /// store is not touched. Other input is stored verbatim.
    pub fn submit_new_task(&self, description: &str) -> Option<PendingWrite> {
        if is_blank_description(description) {
            debug!("event=task_submit module=controller status=skip reason=blank_description");
            return None;
        }

        Some(self.enqueue(Command::Add {
            description: description.to_string(),
        }))
    }

    /// Queues deletion of `task`.
    pub fn submit_delete(&self, task: &Task) -> PendingWrite {
        self.enqueue(Command::Delete { task: task.clone() })
    }

    /// Queues a completion flip for `task`, based on the flag it was
    /// rendered with.
    pub fn submit_toggle(&self, task: &Task) -> PendingWrite {
        self.submit_set_complete(task, !task.complete)
    }

    /// Queues an explicit completion value for `task`. Repeated submissions
    /// of the same value are idempotent.
    pub fn submit_set_complete(&self, task: &Task, complete: bool) -> PendingWrite {
        self.enqueue(Command::SetComplete {
            task: task.clone(),
            complete,
        })
    }

    fn enqueue(&self, command: Command) -> PendingWrite {
        let op = command.label();
        let (ack, pending) = oneshot::channel();
        if self.commands.send(Envelope { command, ack }).is_err() {
            error!("event=task_submit module=controller status=error op={op} error_code=writer_stopped");
        }
        PendingWrite { ack: pending }
    }
}

impl Drop for TaskListController {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

async fn forward_snapshots(
    mut snapshots: TaskSubscription,
    state: watch::Sender<TaskListState>,
) {
    loop {
        let snapshot = snapshots.borrow_and_update().clone();
        let task_count = snapshot.len();
        let previous = state.send_replace(TaskListState::Ready(snapshot));
        if !previous.is_ready() {
            info!("event=task_list_ready module=controller status=ok task_count={task_count}");
        }

        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    debug!("event=task_list_forward module=controller status=stop reason=store_closed");
                    break;
                }
            }
            () = state.closed() => break,
        }
    }
}

async fn drain_commands<S: TaskStore>(
    repo: TaskRepository<S>,
    mut queue: mpsc::UnboundedReceiver<Envelope>,
) {
    while let Some(Envelope { command, ack }) = queue.recv().await {
        let op = command.label();
        let result = match command {
            Command::Add { description } => repo.add_task(description).await,
            Command::Delete { task } => repo.delete_task(&task).await,
            Command::SetComplete { task, complete } => {
                repo.set_task_complete(&task, complete).await
            }
        };

        if let Err(err) = &result {
            // Published state stays at the last committed snapshot.
            error!("event=task_command module=controller status=error op={op} error={err}");
        }
        let _ = ack.send(result);
    }
    debug!("event=task_writer module=controller status=stop reason=queue_closed");
}
