//! Conversation session identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token correlating successive exchanges into one conversation.
///
/// Starts empty; the server assigns a value on the first exchange and the
/// client sends it back on every following one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationSession(String);

impl ConversationSession {
    /// Create an empty session (no conversation yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session from a known identifier.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Whether the server has not assigned an identifier yet.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ConversationSession {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ConversationSession {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
