use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::io::atomic::atomic_write;
use crate::io::lock::StoreLock;
use crate::io::store::{
    StoreError, TaskStore, apply_patches, insert_task, owned_snapshot, patch_with, remove_task,
};
use crate::model::task::{NewTask, Task, TaskPatch};

pub const TASKS_FILE: &str = "tasks.json";

/// On-disk layout of the task file
#[derive(Debug, Default, Serialize, Deserialize)]
struct TaskFile {
    #[serde(default)]
    tasks: Vec<Task>,
}

/// Task store backed by a single JSON file in the data directory.
///
/// Every write is a locked read-modify-write followed by an atomic rename, so
/// a batch is visible either entirely or not at all.
#[derive(Debug, Clone)]
pub struct JsonTaskStore {
    data_dir: PathBuf,
}

impl JsonTaskStore {
    pub fn new(data_dir: &Path) -> Self {
        JsonTaskStore {
            data_dir: data_dir.to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.data_dir.join(TASKS_FILE)
    }

    fn read(&self) -> Result<TaskFile, StoreError> {
        let path = self.tasks_path();
        if !path.exists() {
            return Ok(TaskFile::default());
        }
        let text = fs::read_to_string(&path).map_err(|e| StoreError::Io {
            path: path.clone(),
            source: e,
        })?;
        if text.trim().is_empty() {
            return Ok(TaskFile::default());
        }
        serde_json::from_str(&text).map_err(|e| StoreError::Parse { path, source: e })
    }

    fn write(&self, file: &TaskFile) -> Result<(), StoreError> {
        let path = self.tasks_path();
        let content = serde_json::to_string_pretty(file).map_err(|e| StoreError::Parse {
            path: path.clone(),
            source: e,
        })?;
        atomic_write(&path, content.as_bytes()).map_err(|e| StoreError::Io { path, source: e })
    }

    /// Run `f` against the current file contents under the store lock and
    /// persist the result if `f` succeeds.
    fn modify<T, E: From<StoreError>>(
        &self,
        f: impl FnOnce(&mut TaskFile) -> Result<T, E>,
    ) -> Result<T, E> {
        fs::create_dir_all(&self.data_dir).map_err(|e| StoreError::Io {
            path: self.data_dir.clone(),
            source: e,
        })?;
        let _lock = StoreLock::acquire_default(&self.data_dir).map_err(StoreError::from)?;
        let mut file = self.read()?;
        let value = f(&mut file)?;
        self.write(&file)?;
        Ok(value)
    }
}

impl TaskStore for JsonTaskStore {
    fn create(&self, task: NewTask) -> Result<String, StoreError> {
        let id = self.modify(|file| Ok::<_, StoreError>(insert_task(&mut file.tasks, task)))?;
        tracing::debug!(%id, "task created");
        Ok(id)
    }

    fn update(&self, id: &str, patch: &TaskPatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }
        self.modify(|file| apply_patches(&mut file.tasks, &[(id.to_string(), patch.clone())]))?;
        tracing::debug!(%id, "task updated");
        Ok(())
    }

    fn update_with<E, F>(&self, id: &str, f: F) -> Result<Task, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut Task) -> Result<TaskPatch, E>,
    {
        let task = self.modify(|file| patch_with(&mut file.tasks, id, f))?;
        tracing::debug!(%id, "task updated");
        Ok(task)
    }

    fn apply_batch(&self, patches: &[(String, TaskPatch)]) -> Result<(), StoreError> {
        if patches.is_empty() {
            return Ok(());
        }
        self.modify(|file| apply_patches(&mut file.tasks, patches))?;
        tracing::debug!(count = patches.len(), "batch applied");
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.modify(|file| remove_task(&mut file.tasks, id))?;
        tracing::debug!(%id, "task deleted");
        Ok(())
    }

    fn list(&self, owner_id: &str) -> Result<Vec<Task>, StoreError> {
        let file = self.read()?;
        Ok(owned_snapshot(&file.tasks, owner_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskStatus;
    use crate::ops::task_ops::new_task;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
    }

    fn add(store: &JsonTaskStore, text: &str, owner: &str) -> String {
        store.create(new_task(text, owner, 0, day()).unwrap()).unwrap()
    }

    fn orders(store: &JsonTaskStore, owner: &str) -> Vec<usize> {
        store.list(owner).unwrap().iter().map(|t| t.order).collect()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = JsonTaskStore::new(tmp.path());
        assert!(store.list("u1").unwrap().is_empty());
    }

    #[test]
    fn test_create_and_list_scoped_by_owner() {
        let tmp = TempDir::new().unwrap();
        let store = JsonTaskStore::new(tmp.path());
        let a = add(&store, "first #a", "u1");
        add(&store, "someone else's", "u2");
        let b = add(&store, "second", "u1");

        let mine = store.list("u1").unwrap();
        let ids: Vec<&str> = mine.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![a.as_str(), b.as_str()]);
        assert_eq!(mine[1].order, 1);
        assert_eq!(store.list("u2").unwrap().len(), 1);
    }

    #[test]
    fn test_file_is_human_readable_json() {
        let tmp = TempDir::new().unwrap();
        let store = JsonTaskStore::new(tmp.path());
        add(&store, "write docs", "u1");
        let raw = fs::read_to_string(store.tasks_path()).unwrap();
        assert!(raw.contains("\"status\": \"not-started\""));
        assert!(raw.contains("\"date_created\": \"2025-04-01\""));
    }

    #[test]
    fn test_update_and_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = JsonTaskStore::new(tmp.path());
        let id = add(&store, "x", "u1");
        let patch = TaskPatch {
            status: Some(TaskStatus::OnHold),
            ..Default::default()
        };
        store.update(&id, &patch).unwrap();
        assert_eq!(store.list("u1").unwrap()[0].status, TaskStatus::OnHold);

        assert!(matches!(
            store.update("missing", &patch),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = JsonTaskStore::new(tmp.path());
        let a = add(&store, "a", "u1");
        let b = add(&store, "b", "u1");

        let bad = vec![
            (a.clone(), TaskPatch { order: Some(1), ..Default::default() }),
            ("ghost".to_string(), TaskPatch { order: Some(0), ..Default::default() }),
        ];
        assert!(store.apply_batch(&bad).is_err());
        let orders: Vec<usize> = store.list("u1").unwrap().iter().map(|t| t.order).collect();
        assert_eq!(orders, vec![0, 1]);

        let good = vec![
            (a.clone(), TaskPatch { order: Some(1), ..Default::default() }),
            (b.clone(), TaskPatch { order: Some(0), ..Default::default() }),
        ];
        store.apply_batch(&good).unwrap();
        let listed = store.list("u1").unwrap();
        assert_eq!(listed[0].id, b);
        assert_eq!(listed[1].id, a);
    }

    #[test]
    fn test_delete() {
        let tmp = TempDir::new().unwrap();
        let store = JsonTaskStore::new(tmp.path());
        let id = add(&store, "gone soon", "u1");
        store.delete(&id).unwrap();
        assert!(store.list("u1").unwrap().is_empty());
        assert!(matches!(store.delete(&id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_create_ignores_caller_order() {
        let tmp = TempDir::new().unwrap();
        let store = JsonTaskStore::new(tmp.path());
        add(&store, "first", "u1");
        store
            .create(new_task("second", "u1", 99, day()).unwrap())
            .unwrap();
        store
            .create(new_task("other owner", "u2", 7, day()).unwrap())
            .unwrap();
        assert_eq!(orders(&store, "u1"), vec![0, 1]);
        assert_eq!(orders(&store, "u2"), vec![0]);
    }

    #[test]
    fn test_delete_closes_the_gap() {
        let tmp = TempDir::new().unwrap();
        let store = JsonTaskStore::new(tmp.path());
        let a = add(&store, "a", "u1");
        let b = add(&store, "b", "u1");
        let c = add(&store, "c", "u1");
        add(&store, "elsewhere", "u2");

        store.delete(&b).unwrap();
        let listed = store.list("u1").unwrap();
        let ids: Vec<&str> = listed.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![a.as_str(), c.as_str()]);
        assert_eq!(orders(&store, "u1"), vec![0, 1]);
        assert_eq!(orders(&store, "u2"), vec![0]);

        // The next task lands after the survivors
        add(&store, "d", "u1");
        assert_eq!(orders(&store, "u1"), vec![0, 1, 2]);
    }

    #[test]
    fn test_update_with_reads_stored_task() {
        let tmp = TempDir::new().unwrap();
        let store = JsonTaskStore::new(tmp.path());
        let id = add(&store, "x", "u1");

        let updated = store
            .update_with(&id, |task| {
                assert_eq!(task.status, TaskStatus::NotStarted);
                Ok::<_, StoreError>(TaskPatch {
                    status: Some(TaskStatus::InProgress),
                    ..Default::default()
                })
            })
            .unwrap();
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(store.list("u1").unwrap()[0].status, TaskStatus::InProgress);

        let missing = store.update_with("ghost", |_| Ok::<_, StoreError>(TaskPatch::default()));
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_concurrent_creates_all_survive() {
        let tmp = TempDir::new().unwrap();
        let store = JsonTaskStore::new(tmp.path());

        let acked: Vec<String> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|worker| {
                    let store = store.clone();
                    scope.spawn(move || {
                        (0..10)
                            .map(|i| add(&store, &format!("w{} t{}", worker, i), "u1"))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });

        let listed = store.list("u1").unwrap();
        assert_eq!(listed.len(), acked.len());
        for id in &acked {
            assert!(listed.iter().any(|t| &t.id == id), "lost task {}", id);
        }
        assert_eq!(orders(&store, "u1"), (0..80).collect::<Vec<_>>());
    }

    #[test]
    fn test_racing_adds_from_same_snapshot_get_distinct_orders() {
        let tmp = TempDir::new().unwrap();
        let store = JsonTaskStore::new(tmp.path());
        let barrier = std::sync::Barrier::new(2);

        std::thread::scope(|scope| {
            for name in ["left", "right"] {
                let store = store.clone();
                let barrier = &barrier;
                scope.spawn(move || {
                    // Both writers see an empty list before either writes
                    let count = store.list("u1").unwrap().len();
                    barrier.wait();
                    store
                        .create(new_task(name, "u1", count, day()).unwrap())
                        .unwrap();
                });
            }
        });

        assert_eq!(orders(&store, "u1"), vec![0, 1]);
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(TASKS_FILE), "{ not json").unwrap();
        let store = JsonTaskStore::new(tmp.path());
        assert!(matches!(store.list("u1"), Err(StoreError::Parse { .. })));
    }
}
