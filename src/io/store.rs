//! Persistence port for tasks.
//!
//! The store owns task identity and is the only source of truth: callers
//! re-read a snapshot after writing instead of trusting their local copy.

use std::path::PathBuf;

use crate::io::lock::LockError;
use crate::model::task::{NewTask, Task, TaskPatch};
use crate::ops::view::resequence;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("could not read or write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("task store state is poisoned")]
    Poisoned,
}

/// Task persistence contract.
pub trait TaskStore {
    /// Store a new task and return its assigned id.
    ///
    /// The task's `order` is set to the owner's task count at the moment of
    /// the write, so concurrent creates never share a position.
    fn create(&self, task: NewTask) -> Result<String, StoreError>;

    /// Apply a partial update to one task.
    ///
    /// Returns [`StoreError::NotFound`] when the id is unknown.
    fn update(&self, id: &str, patch: &TaskPatch) -> Result<(), StoreError>;

    /// Compute a patch from the stored task and apply it as one unit, so no
    /// other write lands between the read and the update. `f` gets a copy of
    /// the current task. Returns the task as stored afterwards.
    fn update_with<E, F>(&self, id: &str, f: F) -> Result<Task, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut Task) -> Result<TaskPatch, E>;

    /// Apply several partial updates as one unit. Either every patch is
    /// applied or none is.
    fn apply_batch(&self, patches: &[(String, TaskPatch)]) -> Result<(), StoreError>;

    /// Permanently delete a task and close the gap it leaves in its
    /// owner's manual order, in the same write.
    fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Snapshot of every task owned by `owner_id`, in manual order.
    fn list(&self, owner_id: &str) -> Result<Vec<Task>, StoreError>;
}

/// Apply `patches` to `tasks` in place after checking that every id exists.
pub(crate) fn apply_patches(
    tasks: &mut [Task],
    patches: &[(String, TaskPatch)],
) -> Result<(), StoreError> {
    if let Some((missing, _)) = patches
        .iter()
        .find(|(id, _)| !tasks.iter().any(|t| t.id == *id))
    {
        return Err(StoreError::NotFound(missing.clone()));
    }
    for (id, patch) in patches {
        if let Some(task) = tasks.iter_mut().find(|t| t.id == *id) {
            patch.apply_to(task);
        }
    }
    Ok(())
}

/// Owner-scoped snapshot sorted by manual order.
pub(crate) fn owned_snapshot(tasks: &[Task], owner_id: &str) -> Vec<Task> {
    let mut owned: Vec<Task> = tasks
        .iter()
        .filter(|t| t.owner_id == owner_id)
        .cloned()
        .collect();
    owned.sort_by_key(|t| t.order);
    owned
}

/// Append `task` at the end of its owner's manual order.
pub(crate) fn insert_task(tasks: &mut Vec<Task>, task: NewTask) -> String {
    let id = new_id();
    let mut stored = task.into_task(id.clone());
    stored.order = tasks.iter().filter(|t| t.owner_id == stored.owner_id).count();
    tasks.push(stored);
    id
}

/// Remove a task and resequence the rest of its owner's tasks densely.
pub(crate) fn remove_task(tasks: &mut Vec<Task>, id: &str) -> Result<(), StoreError> {
    let index = tasks
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    let removed = tasks.remove(index);
    let remaining = owned_snapshot(tasks, &removed.owner_id);
    apply_patches(tasks, &resequence(&remaining))
}

/// Run `f` on a copy of the task with `id` and apply the patch it returns.
pub(crate) fn patch_with<E, F>(tasks: &mut [Task], id: &str, f: F) -> Result<Task, E>
where
    E: From<StoreError>,
    F: FnOnce(&mut Task) -> Result<TaskPatch, E>,
{
    let task = tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    let mut draft = task.clone();
    let patch = f(&mut draft)?;
    patch.apply_to(task);
    Ok(task.clone())
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
