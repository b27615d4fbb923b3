/*
    Developer blog:
    - This crate started out as the little "saved jobs" helper from the web front end.
        In the browser it leaned on localStorage plus the `storage` event to keep tabs in sync.
        Outside of the browser neither of those exist, so the storage and the notification
        channel became their own modules and the store only talks to traits.
    - Rule of thumb: nothing in here should ever take the UI down. Bad data on disk means an empty list.
*/

// notification channel shared by every session of the same storage
pub mod bus;

// ordered, copy-on-write collection of saved entries
pub mod collection;

// user configuration for the store
pub mod config;

// provider/accessor pair handed to the UI layer
pub mod context;

// small value types shared across the crate
pub mod models;

// key/value storage backends
pub mod storage;

// the saved items store
pub mod store;

// polls a file backed key for writes made by other processes
pub mod watcher;

pub use collection::SavedCollection;
pub use context::{SavedItems, SavedItemsContext};
pub use models::keyed::Keyed;
pub use models::notice::Notice;
pub use store::SavedItemsStore;
