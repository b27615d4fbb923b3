use crate::collection::SavedCollection;
use std::sync::Arc;

/// What caused the store to swap its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    /// A local toggle.
    Toggled,
    /// Another session wrote to the shared storage.
    Remote,
    /// The storage key was cleared, locally or remotely.
    Cleared,
}

/// Passed to every subscriber after the collection changed.
#[derive(Debug, Clone)]
pub struct Change<T> {
    pub snapshot: Arc<SavedCollection<T>>,
    pub cause: ChangeCause,
}
