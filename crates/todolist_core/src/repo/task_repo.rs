//! Task repository.
//!
//! # Invariants
//! - No caching, retries or validation; every call reaches the store.
//! - Faults are returned unchanged.

use crate::model::task::Task;
use crate::store::{StoreResult, TaskStore, TaskSubscription};

/// Narrow task surface over any [`TaskStore`].
#[derive(Clone)]
pub struct TaskRepository<S: TaskStore> {
    store: S,
}

impl<S: TaskStore> TaskRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Persists a new task. Returns once the write is durable and the
    /// resulting snapshot is published.
    pub async fn add_task(&self, description: String) -> StoreResult<()> {
        self.store.create(description).await.map(|_| ())
    }

    /// Deletes `task` by id; deleting an already-removed task succeeds.
    pub async fn delete_task(&self, task: &Task) -> StoreResult<()> {
        self.store.remove(task.id).await
    }

    /// Persists the completion flag for `task`.
    pub async fn set_task_complete(&self, task: &Task, complete: bool) -> StoreResult<()> {
        self.store.set_complete(task.id, complete).await
    }

    /// Pass-through of the store's full-list subscription.
    pub fn observe_all(&self) -> TaskSubscription {
        self.store.list_all()
    }
}
