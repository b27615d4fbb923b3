use crate::models::change::Change;
use crate::models::keyed::Keyed;
use crate::models::notice::Notice;
use crate::store::{SavedItemsStore, SubscriptionId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Built once at start up and cloned into whatever needs the saved items.
/// Replaces the provider that wrapped the whole web app.
pub struct SavedItemsContext<T> {
    store: Arc<SavedItemsStore<T>>,
}

// manual impl, derive would want T: Clone for no reason.
impl<T> Clone for SavedItemsContext<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<T> SavedItemsContext<T>
where
    T: Keyed + Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn provide(store: SavedItemsStore<T>) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Full access to the store, for the app shell (listening, flushing, clearing).
    pub fn store(&self) -> &Arc<SavedItemsStore<T>> {
        &self.store
    }

    /// What a component gets: check, toggle, list, count.
    pub fn use_saved_items(&self) -> SavedItems<T> {
        SavedItems {
            store: self.store.clone(),
        }
    }
}

/// Consumer side accessor.
pub struct SavedItems<T> {
    store: Arc<SavedItemsStore<T>>,
}

impl<T> SavedItems<T>
where
    T: Keyed + Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn is_saved(&self, id: &str) -> bool {
        self.store.is_saved(id)
    }

    pub fn toggle(&self, entity: T) -> Option<Notice> {
        self.store.toggle(entity)
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.store.get(id)
    }

    pub fn list(&self) -> Vec<T> {
        self.store.list()
    }

    pub fn count(&self) -> usize {
        self.store.count()
    }

    /// Redraw hook. Hand the id back to `unsubscribe` when the component goes away.
    pub fn on_change<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Change<T>) + Send + Sync + 'static,
    {
        self.store.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }
}
