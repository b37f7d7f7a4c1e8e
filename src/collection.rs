// Pure transformations over an ordered task collection
//
// Every mutation takes the current collection by reference and returns the
// next one. On error the input is untouched, so callers can apply the result
// only when it is Ok.

use crate::error::{TaskError, TaskResult};
use crate::task::Task;
use std::collections::HashSet;
use tracing::warn;

/// Insert a new active task at the head of the collection.
///
/// Text is trimmed; blank text is rejected with [`TaskError::Validation`].
pub fn add(tasks: &[Task], id: &str, text: &str, created_at: i64) -> TaskResult<(Vec<Task>, Task)> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TaskError::Validation);
    }

    let task = Task::new(id, text, created_at);
    let mut next = Vec::with_capacity(tasks.len() + 1);
    next.push(task.clone());
    next.extend_from_slice(tasks);
    Ok((next, task))
}

/// Flip the `completed` flag of one task, leaving its position alone.
pub fn toggle(tasks: &[Task], id: &str) -> TaskResult<(Vec<Task>, Task)> {
    let index = position(tasks, id)?;

    let mut next = tasks.to_vec();
    next[index].completed = !next[index].completed;
    let updated = next[index].clone();
    Ok((next, updated))
}

/// Remove one task, returning it alongside the new collection.
pub fn delete(tasks: &[Task], id: &str) -> TaskResult<(Vec<Task>, Task)> {
    let index = position(tasks, id)?;

    let mut next = tasks.to_vec();
    let removed = next.remove(index);
    Ok((next, removed))
}

/// Move the active task `dragged_id` into the slot the active task
/// `target_id` occupies.
///
/// The target's index is taken before the dragged task is lifted out, so
/// moving up lands just above the target and moving down lands just below
/// it. The resulting collection is the reordered active tasks followed by the
/// completed tasks newest first. Both ids must name active tasks.
pub fn reorder(tasks: &[Task], dragged_id: &str, target_id: &str) -> TaskResult<Vec<Task>> {
    let mut active: Vec<Task> = tasks.iter().filter(|t| t.is_active()).cloned().collect();

    let dragged_index = active
        .iter()
        .position(|t| t.id == dragged_id)
        .ok_or_else(|| TaskError::NotFound(dragged_id.to_string()))?;
    let target_index = active
        .iter()
        .position(|t| t.id == target_id)
        .ok_or_else(|| TaskError::NotFound(target_id.to_string()))?;

    if dragged_index == target_index {
        return Ok(tasks.to_vec());
    }

    let dragged = active.remove(dragged_index);
    active.insert(target_index, dragged);

    let completed = completed_partition(tasks).into_iter().cloned();
    active.extend(completed);
    Ok(active)
}

/// Drop every completed task, returning the remaining collection and how
/// many were removed.
pub fn clear_completed(tasks: &[Task]) -> (Vec<Task>, usize) {
    let next: Vec<Task> = tasks.iter().filter(|t| t.is_active()).cloned().collect();
    let removed = tasks.len() - next.len();
    (next, removed)
}

/// Active tasks in collection order
pub fn active_partition(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter().filter(|t| t.is_active()).collect()
}

/// Completed tasks, newest `created_at` first. Ties keep collection order.
pub fn completed_partition(tasks: &[Task]) -> Vec<&Task> {
    let mut completed: Vec<&Task> = tasks.iter().filter(|t| t.completed).collect();
    completed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    completed
}

pub fn contains_id(tasks: &[Task], id: &str) -> bool {
    tasks.iter().any(|t| t.id == id)
}

/// Drop entries that would break the collection invariants: blank text, or
/// an id already seen earlier in the sequence (first one wins).
pub fn sanitize(tasks: Vec<Task>) -> Vec<Task> {
    let mut seen = HashSet::new();
    let mut clean = Vec::with_capacity(tasks.len());

    for task in tasks {
        if task.text.trim().is_empty() {
            warn!(id = %task.id, "Dropping stored task with empty text");
            continue;
        }
        if !seen.insert(task.id.clone()) {
            warn!(id = %task.id, "Dropping stored task with duplicate id");
            continue;
        }
        clean.push(task);
    }

    clean
}

fn position(tasks: &[Task], id: &str) -> TaskResult<usize> {
    tasks
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| TaskError::NotFound(id.to_string()))
}
