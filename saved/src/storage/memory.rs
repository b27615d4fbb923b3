use super::{Storage, StorageError};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// In-process storage. Shared between sessions by wrapping it in an `Arc`.
/// An optional quota (sum of key and value bytes) mimics the browser refusing writes.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            items: RwLock::default(),
            quota: Some(quota),
        }
    }

    fn used_without(items: &HashMap<String, String>, key: &str) -> usize {
        items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(quota) = self.quota {
            let needed = Self::used_without(&items, key) + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_owned(),
                    needed,
                    quota,
                });
            }
        }
        items.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_item("k").unwrap(), None);
        storage.set_item("k", "v").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), Some("v".to_owned()));
        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
        // removing twice is fine
        storage.remove_item("k").unwrap();
    }

    #[test]
    fn quota_counts_replaced_value_once() {
        let storage = MemoryStorage::with_quota(6);
        storage.set_item("k", "abc").unwrap();
        // replacing "abc" with "abcde" needs 1 + 5 bytes, not 1 + 3 + 1 + 5
        storage.set_item("k", "abcde").unwrap();
        let err = storage.set_item("k", "abcdef").unwrap_err();
        assert_eq!(
            err,
            StorageError::QuotaExceeded {
                key: "k".to_owned(),
                needed: 7,
                quota: 6
            }
        );
        // failed write leaves the old value alone
        assert_eq!(storage.get_item("k").unwrap(), Some("abcde".to_owned()));
    }
}
