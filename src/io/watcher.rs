use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::io::json_store::{JsonTaskStore, TASKS_FILE};
use crate::io::store::{StoreError, TaskStore};
use crate::model::task::Task;

/// Error type for subscriptions
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("could not watch data directory: {0}")]
    Notify(#[from] notify::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Live query over one owner's tasks.
///
/// Delivers a full snapshot on start and again after every change to the
/// task file. Snapshots carry no ordering guarantees beyond manual order;
/// consumers recompute their projection on each delivery.
pub struct Subscription {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<()>,
    store: JsonTaskStore,
    owner_id: String,
    initial_pending: bool,
}

impl Subscription {
    pub fn start(store: JsonTaskStore, owner_id: &str) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::channel();
        let tasks_path: PathBuf = store.tasks_path();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(_) => return,
                };
                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }
                // Atomic writes land as a rename onto the task file
                let relevant = event.paths.iter().any(|p| {
                    p == &tasks_path || p.file_name().and_then(|n| n.to_str()) == Some(TASKS_FILE)
                });
                if relevant {
                    let _ = tx.send(());
                }
            },
            Config::default(),
        )?;
        watcher.watch(store.data_dir(), RecursiveMode::NonRecursive)?;
        tracing::info!(dir = %store.data_dir().display(), "subscription started");

        Ok(Subscription {
            _watcher: watcher,
            rx,
            store,
            owner_id: owner_id.to_string(),
            initial_pending: true,
        })
    }

    /// Wait up to `timeout` for the next snapshot. The first call returns the
    /// current snapshot immediately. Bursts of file events are coalesced into
    /// one delivery. Returns `Ok(None)` on timeout.
    pub fn next_snapshot(&mut self, timeout: Duration) -> Result<Option<Vec<Task>>, WatchError> {
        if self.initial_pending {
            self.initial_pending = false;
            return Ok(Some(self.store.list(&self.owner_id)?));
        }
        match self.rx.recv_timeout(timeout) {
            Ok(()) => {
                while self.rx.try_recv().is_ok() {}
                tracing::debug!("task file changed, delivering snapshot");
                Ok(Some(self.store.list(&self.owner_id)?))
            }
            Err(_) => Ok(None),
        }
    }
}
