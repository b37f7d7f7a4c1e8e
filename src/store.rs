// Task store: the authoritative task collection and its persistence

use crate::collection;
use crate::error::TaskResult;
use crate::event::{EventSink, StoreEvent, emit};
use crate::persist::Persistence;
use crate::task::{Task, new_task_id, now_ms};
use tracing::{debug, info, warn};

/// Owns the canonical, ordered task collection
///
/// Each mutation runs a pure transformation from [`collection`], swaps the
/// result in, saves the whole collection, and emits a [`StoreEvent`]. A
/// failed transformation changes nothing and saves nothing. A failed save is
/// logged and reported as [`StoreEvent::StorageFailed`]; the in-memory
/// collection stays authoritative.
pub struct TaskStore {
    tasks: Vec<Task>,
    key: String,
    persistence: Box<dyn Persistence>,
    events: Option<EventSink>,
    last_created_at: i64,
}

impl TaskStore {
    /// Load the collection stored under `key` and build a store around it
    pub fn open(persistence: Box<dyn Persistence>, key: impl Into<String>) -> Self {
        let key = key.into();
        let tasks = collection::sanitize(persistence.load(&key));
        let last_created_at = tasks.iter().map(|t| t.created_at).max().unwrap_or(0);

        info!(
            backend = %persistence.describe(),
            key = %key,
            count = tasks.len(),
            "Opened task store"
        );

        Self {
            tasks,
            key,
            persistence,
            events: None,
            last_created_at,
        }
    }

    /// Deliver events to `sink` from now on
    pub fn with_events(mut self, sink: EventSink) -> Self {
        self.events = Some(sink);
        self
    }

    /// Replace in-memory state with whatever persistence currently holds
    pub fn reload(&mut self) {
        self.tasks = collection::sanitize(self.persistence.load(&self.key));
        let loaded_max = self.tasks.iter().map(|t| t.created_at).max().unwrap_or(0);
        self.last_created_at = self.last_created_at.max(loaded_max);
        debug!(key = %self.key, count = self.tasks.len(), "Reloaded task store");
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The canonical collection, in persisted order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Create a task at the head of the collection
    pub fn add(&mut self, text: &str) -> TaskResult<Task> {
        let id = self.next_id();
        let created_at = self.next_created_at();
        let (next, task) = collection::add(&self.tasks, &id, text, created_at)?;

        self.last_created_at = created_at;
        self.commit(next);
        debug!(id = %task.id, "Added task");
        emit(self.events.as_ref(), StoreEvent::TaskAdded(task.clone()));
        Ok(task)
    }

    /// Flip a task between active and completed
    pub fn toggle_complete(&mut self, id: &str) -> TaskResult<Task> {
        let (next, task) = collection::toggle(&self.tasks, id)?;

        self.commit(next);
        debug!(id, completed = task.completed, "Toggled task");
        emit(self.events.as_ref(), StoreEvent::TaskToggled(task.clone()));
        Ok(task)
    }

    /// Remove a task for good, returning it
    pub fn delete(&mut self, id: &str) -> TaskResult<Task> {
        let (next, removed) = collection::delete(&self.tasks, id)?;

        self.commit(next);
        debug!(id, "Deleted task");
        emit(self.events.as_ref(), StoreEvent::TaskDeleted(removed.clone()));
        Ok(removed)
    }

    /// Move active task `dragged_id` to just before active task `target_id`
    pub fn reorder(&mut self, dragged_id: &str, target_id: &str) -> TaskResult<()> {
        let next = collection::reorder(&self.tasks, dragged_id, target_id)?;
        if dragged_id == target_id {
            return Ok(());
        }

        self.commit(next);
        debug!(dragged_id, target_id, "Reordered tasks");
        emit(
            self.events.as_ref(),
            StoreEvent::TasksReordered {
                dragged_id: dragged_id.to_string(),
                target_id: target_id.to_string(),
            },
        );
        Ok(())
    }

    /// Remove every completed task, returning how many went
    pub fn clear_completed(&mut self) -> usize {
        let (next, count) = collection::clear_completed(&self.tasks);

        if count > 0 {
            self.commit(next);
            debug!(count, "Cleared completed tasks");
        }
        emit(self.events.as_ref(), StoreEvent::CompletedCleared { count });
        count
    }

    pub fn active_partition(&self) -> Vec<&Task> {
        collection::active_partition(&self.tasks)
    }

    pub fn completed_partition(&self) -> Vec<&Task> {
        collection::completed_partition(&self.tasks)
    }

    fn commit(&mut self, next: Vec<Task>) {
        self.tasks = next;
        self.persist();
    }

    fn persist(&self) {
        if let Err(e) = self.persistence.save(&self.key, &self.tasks) {
            warn!(key = %self.key, error = %e, "Failed to save tasks, keeping in-memory state");
            emit(
                self.events.as_ref(),
                StoreEvent::StorageFailed { message: e.to_string() },
            );
        }
    }

    // Never earlier than the newest task we have handed out or loaded
    fn next_created_at(&self) -> i64 {
        now_ms().max(self.last_created_at)
    }

    fn next_id(&self) -> String {
        loop {
            let id = new_task_id();
            if !collection::contains_id(&self.tasks, &id) {
                return id;
            }
        }
    }
}
