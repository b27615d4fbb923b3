use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;

/// Ordered map of `id -> payload`, oldest save first.
///
/// The collection is never mutated once handed out. [`SavedCollection::toggled`] builds a
/// new one instead, so holders of an `Arc` to the previous value can tell it changed.
///
/// On disk it is a json array of `[id, payload]` pairs.
#[derive(Debug, Clone)]
pub struct SavedCollection<T> {
    entries: Vec<(String, T)>,
    // membership lookup, kept in sync with entries
    ids: HashSet<String>,
}

impl<T> Default for SavedCollection<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            ids: HashSet::new(),
        }
    }
}

impl<T: Clone> SavedCollection<T> {
    /// Build from a list of pairs. A repeated id keeps its first position and takes the last payload.
    /// Pairs with an empty id are dropped.
    pub fn from_entries(pairs: impl IntoIterator<Item = (String, T)>) -> Self {
        let mut collection = Self::default();
        for (id, payload) in pairs {
            if id.is_empty() {
                continue;
            }
            if collection.ids.contains(&id) {
                if let Some(entry) = collection.entries.iter_mut().find(|(k, _)| *k == id) {
                    entry.1 = payload;
                }
            } else {
                collection.ids.insert(id.clone());
                collection.entries.push((id, payload));
            }
        }
        collection
    }

    /// Return a copy with `id` removed if it was present, or with `payload` appended otherwise.
    /// The bool is true when the entry ended up saved.
    pub fn toggled(&self, id: &str, payload: T) -> (Self, bool) {
        if self.contains(id) {
            let entries = self
                .entries
                .iter()
                .filter(|(k, _)| k != id)
                .cloned()
                .collect();
            let mut ids = self.ids.clone();
            ids.remove(id);
            (Self { entries, ids }, false)
        } else {
            let mut next = self.clone();
            next.ids.insert(id.to_owned());
            next.entries.push((id.to_owned(), payload));
            (next, true)
        }
    }
}

impl<T> SavedCollection<T> {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == id).then_some(v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recently saved first.
    pub fn iter_recent(&self) -> impl Iterator<Item = &T> + '_ {
        self.entries.iter().rev().map(|(_, v)| v)
    }

    /// Ids in save order, oldest first.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<T: Serialize> Serialize for SavedCollection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de, T: DeserializeOwned + Clone> Deserialize<'de> for SavedCollection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pairs = Vec::<(String, T)>::deserialize(deserializer)?;
        Ok(Self::from_entries(pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn job(id: &str, title: &str) -> Value {
        json!({ "id": id, "title": title })
    }

    #[test]
    fn toggle_adds_then_removes() {
        let empty = SavedCollection::<Value>::default();
        let (saved, is_saved) = empty.toggled("1", job("1", "A"));
        assert!(is_saved);
        assert!(saved.contains("1"));
        assert_eq!(saved.len(), 1);
        // original is untouched
        assert!(empty.is_empty());

        let (removed, is_saved) = saved.toggled("1", job("1", "A"));
        assert!(!is_saved);
        assert!(!removed.contains("1"));
        assert!(removed.is_empty());
    }

    #[test]
    fn recent_first_ordering() {
        let c = SavedCollection::default();
        let (c, _) = c.toggled("a", job("a", "A"));
        let (c, _) = c.toggled("b", job("b", "B"));
        let (c, _) = c.toggled("c", job("c", "C"));
        let titles: Vec<_> = c.iter_recent().map(|v| v["title"].clone()).collect();
        assert_eq!(titles, vec![json!("C"), json!("B"), json!("A")]);
    }

    #[test]
    fn serializes_as_entries_list() {
        let (c, _) = SavedCollection::default().toggled("42", job("42", "Fix sink"));
        let raw = serde_json::to_string(&c).unwrap();
        assert_eq!(raw, r#"[["42",{"id":"42","title":"Fix sink"}]]"#);

        let back: SavedCollection<Value> = serde_json::from_str(&raw).unwrap();
        assert!(back.contains("42"));
        assert_eq!(back.get("42"), Some(&job("42", "Fix sink")));
    }

    #[test]
    fn duplicate_ids_keep_first_position_and_last_payload() {
        let raw = r#"[["1",{"v":1}],["2",{"v":2}],["1",{"v":3}],["",{"v":4}]]"#;
        let c: SavedCollection<Value> = serde_json::from_str(raw).unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c.ids().collect::<Vec<_>>(), vec!["1", "2"]);
        assert_eq!(c.get("1"), Some(&json!({ "v": 3 })));
    }

    #[test]
    fn wrong_shape_fails_to_parse() {
        assert!(serde_json::from_str::<SavedCollection<Value>>(r#"{"1":{}}"#).is_err());
        assert!(serde_json::from_str::<SavedCollection<Value>>("not json").is_err());
    }
}
