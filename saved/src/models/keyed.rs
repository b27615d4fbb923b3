use serde_json::Value;

/// Anything the store can save must be able to tell us its id.
/// `None` or an empty string means the entity has no id, and the store will ignore it.
pub trait Keyed {
    fn key(&self) -> Option<String>;
}

/// Helper to treat an empty id the same way as a missing one.
pub(crate) fn valid_key<T: Keyed + ?Sized>(entity: &T) -> Option<String> {
    entity.key().filter(|id| !id.is_empty())
}

// raw json payloads coming straight from the api. Ids show up as string or number depending on the endpoint.
impl Keyed for Value {
    fn key(&self) -> Option<String> {
        match self.get("id")? {
            Value::String(id) => Some(id.to_owned()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}
