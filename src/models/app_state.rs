use super::error::AppError;
use super::job::Job;
use saved::bus::StorageBus;
use saved::config::StoreConfig;
use saved::storage::{FileStorage, SharedStorage, Storage};
use saved::store::SavedItemsStore;
use saved::watcher::FileWatcher;
use saved::SavedItemsContext;
use std::sync::Arc;

/// Everything a command needs. Built once in `run` and handed down.
pub struct AppState {
    pub config: StoreConfig,
    pub saved_jobs: SavedItemsContext<Job>,
    files: Arc<FileStorage>,
    storage: SharedStorage,
}

impl AppState {
    /// Open the data directory from the config and hydrate the saved jobs.
    pub fn new(config: StoreConfig) -> Result<Self, AppError> {
        let files = Arc::new(FileStorage::open(&config.data_dir)?);
        let backend: Arc<dyn Storage> = files.clone();
        let storage = SharedStorage::new(backend, StorageBus::new(config.bus_capacity));
        let store = SavedItemsStore::initialize(config.storage_key.clone(), storage.open_tab());
        Ok(Self {
            saved_jobs: SavedItemsContext::provide(store),
            config,
            files,
            storage,
        })
    }

    /// Watcher for writes made to the data directory by other processes.
    /// The store is reloaded once the watcher has its baseline, so nothing written since
    /// start up is lost between the two.
    pub fn file_watcher(&self) -> FileWatcher {
        let watcher = FileWatcher::new(
            self.files.clone(),
            self.config.storage_key.clone(),
            self.storage.bus().clone(),
            self.config.watch_interval(),
        );
        self.saved_jobs.store().resync();
        watcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_states_on_one_directory_share_data() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            data_dir: dir.path().to_path_buf(),
            ..StoreConfig::default()
        };

        let first = AppState::new(config.clone()).unwrap();
        first
            .saved_jobs
            .use_saved_items()
            .toggle(Job::new("42", "Fix sink"));

        let second = AppState::new(config).unwrap();
        assert!(second.saved_jobs.use_saved_items().is_saved("42"));
    }

    #[test]
    fn watcher_picks_up_writes_made_after_start_up() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            data_dir: dir.path().to_path_buf(),
            ..StoreConfig::default()
        };

        let watching = AppState::new(config.clone()).unwrap();
        let other = AppState::new(config).unwrap();
        other
            .saved_jobs
            .use_saved_items()
            .toggle(Job::new("7", "Paint fence"));
        assert!(!watching.saved_jobs.use_saved_items().is_saved("7"));

        let mut watcher = watching.file_watcher();
        assert!(watching.saved_jobs.use_saved_items().is_saved("7"));
        assert!(!watcher.poll_once());

        other
            .saved_jobs
            .use_saved_items()
            .toggle(Job::new("8", "Mow lawn"));
        assert!(watcher.poll_once());
        assert_eq!(watching.saved_jobs.store().sync_pending(), 1);
        assert_eq!(watching.saved_jobs.use_saved_items().count(), 2);
    }
}
