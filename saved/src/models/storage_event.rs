use super::tab_id::TabId;

/// Fired whenever a value in the shared storage changes.
/// `new_value` of `None` means the key was removed.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageEvent {
    pub key: String,
    pub new_value: Option<String>,
    pub origin: TabId,
}

impl StorageEvent {
    pub fn new(key: impl Into<String>, new_value: Option<String>, origin: TabId) -> Self {
        Self {
            key: key.into(),
            new_value,
            origin,
        }
    }

    /// True when the key was removed, or set to nothing at all.
    pub fn is_cleared(&self) -> bool {
        self.new_value.as_deref().map_or(true, str::is_empty)
    }
}
