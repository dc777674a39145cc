use std::sync::{Arc, RwLock};

use crate::io::store::{
    StoreError, TaskStore, apply_patches, insert_task, owned_snapshot, patch_with, remove_task,
};
use crate::model::task::{NewTask, Task, TaskPatch};

/// Thread-safe in-memory task store for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<Vec<Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for InMemoryTaskStore {
    fn create(&self, task: NewTask) -> Result<String, StoreError> {
        let mut tasks = self.tasks.write().map_err(|_| StoreError::Poisoned)?;
        Ok(insert_task(&mut tasks, task))
    }

    fn update(&self, id: &str, patch: &TaskPatch) -> Result<(), StoreError> {
        self.apply_batch(&[(id.to_string(), patch.clone())])
    }

    fn update_with<E, F>(&self, id: &str, f: F) -> Result<Task, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut Task) -> Result<TaskPatch, E>,
    {
        let mut tasks = self.tasks.write().map_err(|_| StoreError::Poisoned)?;
        patch_with(&mut tasks, id, f)
    }

    fn apply_batch(&self, patches: &[(String, TaskPatch)]) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().map_err(|_| StoreError::Poisoned)?;
        apply_patches(&mut tasks, patches)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().map_err(|_| StoreError::Poisoned)?;
        remove_task(&mut tasks, id)
    }

    fn list(&self, owner_id: &str) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().map_err(|_| StoreError::Poisoned)?;
        Ok(owned_snapshot(&tasks, owner_id))
    }
}
