/*
    Developer blog:
    - localStorage gave us three calls and a shared event. This module keeps the same shape:
        `Storage` is the three calls, `SharedStorage` is the "origin" every session points at,
        and `TabStorage` is one session's view that announces its writes on the bus.
    - All calls are synchronous on purpose. Storage here is a tiny json blob and we never want
        the store to await in the middle of a toggle.
*/
use crate::bus::{StorageBus, StorageEvents};
use crate::models::storage_event::StorageEvent;
use crate::models::tab_id::TabId;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    #[error("Storage is unavailable: {0}")]
    Unavailable(String),
    #[error("Storage quota exceeded writing {key}: needs {needed} bytes, quota is {quota}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },
    #[error("IO Error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

/// Key/value string storage, modelled after the browser's localStorage.
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// One backend plus the bus every session listens on.
#[derive(Clone)]
pub struct SharedStorage {
    backend: Arc<dyn Storage>,
    bus: StorageBus,
}

impl SharedStorage {
    pub fn new(backend: Arc<dyn Storage>, bus: StorageBus) -> Self {
        Self { backend, bus }
    }

    pub fn bus(&self) -> &StorageBus {
        &self.bus
    }

    /// Open a new session against this storage. Every call returns a distinct tab id.
    pub fn open_tab(&self) -> TabStorage {
        let tab = TabStorage {
            id: TabId::new(),
            backend: self.backend.clone(),
            bus: self.bus.clone(),
        };
        debug!("Opened storage session {}", tab.id);
        tab
    }
}

/// One session's handle. Writes go to the backend and are announced to the other sessions.
#[derive(Clone)]
pub struct TabStorage {
    id: TabId,
    backend: Arc<dyn Storage>,
    bus: StorageBus,
}

impl TabStorage {
    pub fn id(&self) -> TabId {
        self.id
    }

    /// Start receiving changes made to `key` by other sessions.
    pub fn events(&self, key: &str) -> StorageEvents {
        self.bus.subscribe(key, self.id)
    }

    // every successful write goes out, receivers drop values they already hold.
    fn announce(&self, key: &str, new_value: Option<String>) {
        self.bus.publish(StorageEvent::new(key, new_value, self.id));
    }
}

impl Storage for TabStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.backend.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.backend.set_item(key, value)?;
        self.announce(key, Some(value.to_owned()));
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.backend.remove_item(key)?;
        self.announce(key, None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Received;

    fn shared() -> SharedStorage {
        SharedStorage::new(Arc::new(MemoryStorage::new()), StorageBus::new(16))
    }

    #[test]
    fn writes_are_visible_to_every_tab() {
        let storage = shared();
        let a = storage.open_tab();
        let b = storage.open_tab();
        assert_ne!(a.id(), b.id());

        a.set_item("savedJobs", "[]").unwrap();
        assert_eq!(b.get_item("savedJobs").unwrap(), Some("[]".to_owned()));
    }

    #[test]
    fn other_tabs_are_notified_but_not_the_writer() {
        let storage = shared();
        let a = storage.open_tab();
        let b = storage.open_tab();
        let mut a_events = a.events("savedJobs");
        let mut b_events = b.events("savedJobs");

        a.set_item("savedJobs", "[]").unwrap();

        assert_eq!(a_events.try_next(), Received::Empty);
        match b_events.try_next() {
            Received::Event(event) => {
                assert_eq!(event.new_value.as_deref(), Some("[]"));
                assert_eq!(event.origin, a.id());
            }
            other => panic!("expected an event, got {other:?}"),
        }
    }

    #[test]
    fn every_successful_write_is_announced() {
        let storage = shared();
        let a = storage.open_tab();
        let b = storage.open_tab();
        a.set_item("k", "same").unwrap();

        let mut b_events = b.events("k");
        a.set_item("k", "same").unwrap();
        match b_events.try_next() {
            Received::Event(event) => assert_eq!(event.new_value.as_deref(), Some("same")),
            other => panic!("expected an event, got {other:?}"),
        }

        a.remove_item("k").unwrap();
        match b_events.try_next() {
            Received::Event(event) => assert!(event.is_cleared()),
            other => panic!("expected a clear event, got {other:?}"),
        }
    }

    #[test]
    fn failed_write_is_not_announced() {
        let storage = SharedStorage::new(
            Arc::new(MemoryStorage::with_quota(4)),
            StorageBus::new(16),
        );
        let a = storage.open_tab();
        let b = storage.open_tab();
        let mut b_events = b.events("k");

        assert!(matches!(
            a.set_item("k", "too long"),
            Err(StorageError::QuotaExceeded { .. })
        ));
        assert_eq!(b_events.try_next(), Received::Empty);
    }
}
