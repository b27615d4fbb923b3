/*
    Developer blog:
    - The storage bus only reaches sessions living in this process. Two copies of the app pointing at
        the same data directory need something else, and polling the key's file turned out to be
        plenty for a json blob that changes when someone clicks a button.
    - Anything the watcher sees is published as an external change. Our own writes come back
        through here too, but the store ignores a value it already holds.
*/
use crate::bus::StorageBus;
use crate::models::storage_event::StorageEvent;
use crate::models::tab_id::TabId;
use crate::storage::{FileStorage, Storage};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

pub struct FileWatcher {
    storage: Arc<FileStorage>,
    key: String,
    bus: StorageBus,
    interval: Duration,
    last_seen: Option<String>,
}

impl FileWatcher {
    /// The value currently on disk is taken as already seen.
    pub fn new(
        storage: Arc<FileStorage>,
        key: impl Into<String>,
        bus: StorageBus,
        interval: Duration,
    ) -> Self {
        let key = key.into();
        let last_seen = storage.get_item(&key).ok().flatten();
        Self {
            storage,
            key,
            bus,
            interval,
            last_seen,
        }
    }

    /// Compare the file against the last value seen, publish if it changed.
    /// Returns true when an event went out.
    pub fn poll_once(&mut self) -> bool {
        let current = match self.storage.get_item(&self.key) {
            Ok(current) => current,
            Err(e) => {
                warn!("Unable to read {} while watching: {e}", self.key);
                return false;
            }
        };
        if current == self.last_seen {
            return false;
        }
        debug!("{} changed on disk", self.key);
        self.last_seen = current.clone();
        self.bus.publish(StorageEvent::new(
            self.key.clone(),
            current,
            TabId::EXTERNAL,
        ));
        true
    }

    /// Poll on an interval until the task is aborted. Must be called inside a tokio runtime.
    pub fn spawn(mut self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                self.poll_once();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Received;
    use crate::storage::SharedStorage;
    use crate::store::SavedItemsStore;
    use serde_json::{json, Value};

    const KEY: &str = "savedJobs";

    // two "processes": separate buses, same directory
    fn process(dir: &std::path::Path) -> (Arc<FileStorage>, SharedStorage) {
        let files = Arc::new(FileStorage::open(dir).unwrap());
        let shared = SharedStorage::new(files.clone(), StorageBus::new(16));
        (files, shared)
    }

    #[test]
    fn publishes_only_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let (files, shared) = process(dir.path());
        let mut watcher = FileWatcher::new(
            files.clone(),
            KEY,
            shared.bus().clone(),
            Duration::from_millis(10),
        );
        let mut events = shared.bus().subscribe(KEY, TabId::new());

        assert!(!watcher.poll_once());
        files.set_item(KEY, "[]").unwrap();
        assert!(watcher.poll_once());
        assert!(!watcher.poll_once());
        files.remove_item(KEY).unwrap();
        assert!(watcher.poll_once());

        assert!(
            matches!(events.try_next(), Received::Event(e) if e.new_value.as_deref() == Some("[]"))
        );
        assert!(matches!(events.try_next(), Received::Event(e) if e.is_cleared()));
    }

    #[test]
    fn converges_two_processes_sharing_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let (_, first) = process(dir.path());
        let (second_files, second) = process(dir.path());

        let writer: SavedItemsStore<Value> = SavedItemsStore::initialize(KEY, first.open_tab());
        let reader: SavedItemsStore<Value> = SavedItemsStore::initialize(KEY, second.open_tab());
        let mut watcher = FileWatcher::new(
            second_files,
            KEY,
            second.bus().clone(),
            Duration::from_millis(10),
        );

        writer.toggle(json!({ "id": "42", "title": "Fix sink" }));
        assert!(!reader.is_saved("42"));

        assert!(watcher.poll_once());
        assert_eq!(reader.sync_pending(), 1);
        assert!(reader.is_saved("42"));
    }

    #[tokio::test]
    async fn spawned_watcher_feeds_listening_store() {
        let dir = tempfile::tempdir().unwrap();
        let (_, first) = process(dir.path());
        let (second_files, second) = process(dir.path());

        let writer: SavedItemsStore<Value> = SavedItemsStore::initialize(KEY, first.open_tab());
        let reader: Arc<SavedItemsStore<Value>> =
            Arc::new(SavedItemsStore::initialize(KEY, second.open_tab()));
        let listener = reader.listen().unwrap();
        let watcher = FileWatcher::new(
            second_files,
            KEY,
            second.bus().clone(),
            Duration::from_millis(5),
        )
        .spawn();

        writer.toggle(json!({ "id": "7", "title": "Paint fence" }));

        let waited = tokio::time::timeout(Duration::from_secs(2), async {
            while !reader.is_saved("7") {
                time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(waited.is_ok());

        watcher.abort();
        listener.abort();
    }
}
