/*
    Developer blog:
    - The web version kept a Map in a React context and called it a day. Here the store is an
        explicit object the app builds once and passes around (see context.rs), no globals.
    - Every toggle swaps in a brand new collection behind an Arc. Cheap enough for a list of
        bookmarks and it lets the UI compare pointers to decide whether to redraw.
    - Sync between sessions is last-write-wins. Whoever wrote the storage last decides what
        every session ends up with. There's no merge and there won't be one.
    - Nothing in the public surface returns an error except `flush`. A broken disk should never stop
        someone from clicking the bookmark button.
*/
use crate::bus::{Received, StorageEvents};
use crate::collection::SavedCollection;
use crate::models::change::{Change, ChangeCause};
use crate::models::keyed::{valid_key, Keyed};
use crate::models::notice::Notice;
use crate::models::storage_event::StorageEvent;
use crate::models::tab_id::TabId;
use crate::storage::{Storage, StorageError, TabStorage};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const NOTICE_CAPACITY: usize = 16;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unable to serialize saved items: {0}")]
    Serialize(String),
    #[error("Unable to parse saved items: {0}")]
    Deserialize(String),
    #[error("Storage error: {source}")]
    Storage {
        #[from]
        source: StorageError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<T> = Arc<dyn Fn(&Change<T>) + Send + Sync>;

pub struct SavedItemsStore<T> {
    key: String,
    storage: TabStorage,
    items: RwLock<Arc<SavedCollection<T>>>,
    // set when the last write to storage failed and memory is ahead of disk.
    dirty: AtomicBool,
    // taken by `listen`, otherwise drained by `sync_pending`.
    events: Mutex<Option<StorageEvents>>,
    listeners: Mutex<Vec<(SubscriptionId, Listener<T>)>>,
    next_listener: AtomicU64,
    notices: broadcast::Sender<Notice>,
}

impl<T> SavedItemsStore<T>
where
    T: Keyed + Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Hydrate the store from `key` and start listening for changes from other sessions.
    /// Missing or unreadable data gives an empty store, never an error.
    pub fn initialize(key: impl Into<String>, storage: TabStorage) -> Self {
        let key = key.into();
        // subscribe before reading so a write landing in between is not lost.
        let events = storage.events(&key);

        let items = match storage.get_item(&key) {
            Ok(Some(raw)) => Self::parse(&raw).unwrap_or_else(|e| {
                warn!("Discarding saved items under {key}: {e}");
                SavedCollection::default()
            }),
            Ok(None) => SavedCollection::default(),
            Err(e) => {
                warn!("Unable to read saved items under {key}: {e}");
                SavedCollection::default()
            }
        };
        info!(
            "Loaded {} saved item(s) from {key} for session {}",
            items.len(),
            storage.id()
        );

        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            key,
            storage,
            items: RwLock::new(Arc::new(items)),
            dirty: AtomicBool::new(false),
            events: Mutex::new(Some(events)),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(0),
            notices,
        }
    }

    fn parse(raw: &str) -> Result<SavedCollection<T>, StoreError> {
        serde_json::from_str(raw).map_err(|e| StoreError::Deserialize(e.to_string()))
    }

    fn serialize(items: &SavedCollection<T>) -> Result<String, StoreError> {
        serde_json::to_string(items).map_err(|e| StoreError::Serialize(e.to_string()))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The current collection. Compare with `Arc::ptr_eq` to detect a change.
    pub fn snapshot(&self) -> Arc<SavedCollection<T>> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_saved(&self, id: &str) -> bool {
        !id.is_empty() && self.snapshot().contains(id)
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.snapshot().get(id).cloned()
    }

    /// All saved payloads, most recently saved first.
    pub fn list(&self) -> Vec<T> {
        self.snapshot().iter_recent().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.snapshot().len()
    }

    /// True when memory holds changes that did not make it to storage.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Save the entity if it isn't saved, remove it otherwise.
    /// Entities without an id are ignored and give `None`.
    pub fn toggle(&self, entity: T) -> Option<Notice> {
        let Some(id) = valid_key(&entity) else {
            debug!("Ignoring toggle for an entity without id");
            return None;
        };

        // keep the write lock across the storage write so memory and disk move in call order.
        let (snapshot, saved, persisted) = {
            let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
            let (next, saved) = items.toggled(&id, entity);
            let next = Arc::new(next);
            *items = next.clone();
            let persisted = self.persist(&next);
            (next, saved, persisted)
        };

        self.notify(&Change {
            snapshot,
            cause: ChangeCause::Toggled,
        });

        let notice = if saved {
            Notice::Saved { id, persisted }
        } else {
            Notice::Removed { id, persisted }
        };
        debug!("{notice}");
        let _ = self.notices.send(notice.clone());
        Some(notice)
    }

    // in-memory state has already moved on, a failure here only gets logged.
    fn persist(&self, items: &SavedCollection<T>) -> bool {
        let result = Self::serialize(items).and_then(|raw| {
            self.storage
                .set_item(&self.key, &raw)
                .map_err(StoreError::from)
        });
        match result {
            Ok(()) => {
                self.dirty.store(false, Ordering::SeqCst);
                true
            }
            Err(e) => {
                error!("Unable to persist saved items under {}: {e}", self.key);
                self.dirty.store(true, Ordering::SeqCst);
                false
            }
        }
    }

    /// Retry a write that failed earlier. Does nothing when storage is already up to date.
    pub fn flush(&self) -> Result<(), StoreError> {
        if !self.is_dirty() {
            return Ok(());
        }
        let items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let raw = Self::serialize(&items)?;
        self.storage.set_item(&self.key, &raw)?;
        self.dirty.store(false, Ordering::SeqCst);
        info!("Flushed {} saved item(s) to {}", items.len(), self.key);
        Ok(())
    }

    /// Forget everything and drop the key from storage. Other sessions reset too.
    pub fn clear(&self) {
        let snapshot = {
            let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
            match self.storage.remove_item(&self.key) {
                Ok(()) => self.dirty.store(false, Ordering::SeqCst),
                Err(e) => {
                    error!("Unable to clear saved items under {}: {e}", self.key);
                    self.dirty.store(true, Ordering::SeqCst);
                }
            }
            if items.is_empty() {
                return;
            }
            let next = Arc::new(SavedCollection::default());
            *items = next.clone();
            next
        };
        self.notify(&Change {
            snapshot,
            cause: ChangeCause::Cleared,
        });
    }

    /// Apply a change announced by another session. Returns true when our collection changed.
    pub fn apply_event(&self, event: &StorageEvent) -> bool {
        if event.key != self.key {
            return false;
        }
        match event.new_value.as_deref() {
            Some(raw) if !raw.is_empty() => match Self::parse(raw) {
                Ok(items) => self.replace(items, ChangeCause::Remote),
                Err(e) => {
                    warn!(
                        "Ignoring unreadable change to {} from {}: {e}",
                        self.key, event.origin
                    );
                    false
                }
            },
            _ => self.replace(SavedCollection::default(), ChangeCause::Cleared),
        }
    }

    // swap the whole collection, unless it is the same data we already hold.
    fn replace(&self, next: SavedCollection<T>, cause: ChangeCause) -> bool {
        let snapshot = {
            let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
            let current = Self::serialize(&items).ok();
            if current.is_some() && current == Self::serialize(&next).ok() {
                return false;
            }
            let next = Arc::new(next);
            *items = next.clone();
            // storage now holds someone else's write, ours is superseded.
            self.dirty.store(false, Ordering::SeqCst);
            next
        };
        debug!(
            "Saved items under {} replaced ({cause:?}), now {}",
            self.key,
            snapshot.len()
        );
        self.notify(&Change { snapshot, cause });
        true
    }

    /// Reload from storage, for when changes may have been missed. Returns true when the
    /// collection changed.
    pub fn resync(&self) -> bool {
        match self.storage.get_item(&self.key) {
            Ok(value) => self.apply_event(&StorageEvent::new(
                self.key.clone(),
                value,
                TabId::EXTERNAL,
            )),
            Err(e) => {
                warn!("Unable to resync saved items under {}: {e}", self.key);
                false
            }
        }
    }

    fn handle(&self, received: Received) -> bool {
        match received {
            // a newer write, maybe our own, may have landed since this one was sent.
            Received::Event(event) => match self.storage.get_item(&self.key) {
                Ok(latest) if latest != event.new_value => {
                    debug!("Change from {} is stale, using the stored value", event.origin);
                    self.apply_event(&StorageEvent::new(self.key.clone(), latest, event.origin))
                }
                _ => self.apply_event(&event),
            },
            Received::Lagged(missed) => {
                warn!("Missed {missed} change(s) to {}, resyncing", self.key);
                self.resync()
            }
            Received::Empty | Received::Closed => false,
        }
    }

    /// Process every pending change from other sessions, for callers running their own event loop.
    /// Returns how many of them changed the collection. Always 0 once `listen` took over.
    pub fn sync_pending(&self) -> usize {
        let pending = {
            let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
            let Some(events) = events.as_mut() else {
                return 0;
            };
            let mut pending = Vec::new();
            loop {
                match events.try_next() {
                    Received::Empty | Received::Closed => break,
                    received => pending.push(received),
                }
            }
            pending
        };
        pending
            .into_iter()
            .map(|received| self.handle(received))
            .filter(|changed| *changed)
            .count()
    }

    /// Hand the change receiver to a background task that applies changes as they arrive.
    /// Must be called inside a tokio runtime. Returns `None` if already listening.
    pub fn listen(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        let store: Weak<Self> = Arc::downgrade(self);
        Some(tokio::spawn(async move {
            loop {
                let received = events.next().await;
                if received == Received::Closed {
                    debug!("Storage bus closed for {}", events.key());
                    break;
                }
                // the store is gone, nobody left to update.
                let Some(strong) = store.upgrade() else {
                    break;
                };
                strong.handle(received);
            }
        }))
    }

    /// Register a callback fired after every change to the collection.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Change<T>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_listener.fetch_add(1, Ordering::SeqCst));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(k, _)| *k != id);
        listeners.len() != before
    }

    // callbacks run outside of every lock so they are free to call back into the store.
    fn notify(&self, change: &Change<T>) {
        let listeners: Vec<Listener<T>> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, f)| f.clone())
            .collect();
        for listener in listeners {
            listener(change);
        }
    }

    /// Toast messages for every toggle.
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }
}
