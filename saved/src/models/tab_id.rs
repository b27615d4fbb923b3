use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies one session (a "tab") reading and writing the shared storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(Uuid);

impl TabId {
    /// Origin used for changes we did not make ourselves, e.g. another process touching the file.
    pub const EXTERNAL: TabId = TabId(Uuid::nil());

    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn is_external(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_external() {
            write!(f, "external")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
