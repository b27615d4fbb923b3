use serde::{Deserialize, Serialize};
use std::fmt;

/// Confirmation handed back to the user after a toggle. Think of it as the toast message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    Saved { id: String, persisted: bool },
    Removed { id: String, persisted: bool },
}

impl Notice {
    pub fn id(&self) -> &str {
        match self {
            Notice::Saved { id, .. } | Notice::Removed { id, .. } => id,
        }
    }

    /// false when the change only lives in memory and will be lost on reload.
    pub fn persisted(&self) -> bool {
        match self {
            Notice::Saved { persisted, .. } | Notice::Removed { persisted, .. } => *persisted,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, Notice::Saved { .. })
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Notice::Saved { .. } => "Saved!",
            Notice::Removed { .. } => "Removed",
        };
        if self.persisted() {
            write!(f, "{msg}")
        } else {
            write!(f, "{msg} (this session only, could not write to storage)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_mentions_session_only_when_not_persisted() {
        let ok = Notice::Saved {
            id: "1".to_owned(),
            persisted: true,
        };
        assert_eq!(ok.to_string(), "Saved!");

        let failed = Notice::Removed {
            id: "1".to_owned(),
            persisted: false,
        };
        assert!(failed.to_string().starts_with("Removed"));
        assert!(failed.to_string().contains("this session only"));
    }
}
