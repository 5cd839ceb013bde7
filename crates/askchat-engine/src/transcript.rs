//! Append-only conversation transcript.
//!
//! The transcript is the model behind the conversation pane: an ordered list
//! of entries that only ever grows. The single exception to immutability is
//! the assistant placeholder, whose text is replaced exactly once when the
//! reply (or a failure) arrives.

use crate::chat::{ChatMessage, Role};
use tracing::warn;

/// Handle to a transcript entry, returned when the entry is appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHandle(usize);

impl MessageHandle {
    /// Position of the entry in the transcript.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Display status of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryStatus {
    /// Final content.
    #[default]
    Complete,
    /// Assistant placeholder waiting for the reply.
    Pending,
    /// Assistant placeholder replaced by an error indication.
    Failed,
}

/// A single transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    /// The message shown to the user.
    pub message: ChatMessage,
    /// Loading/error marker.
    pub status: EntryStatus,
}

impl TranscriptEntry {
    /// Whether the entry is still waiting for its content.
    pub fn is_pending(&self) -> bool {
        self.status == EntryStatus::Pending
    }

    /// Whether the entry shows an error indication.
    pub fn is_failed(&self) -> bool {
        self.status == EntryStatus::Failed
    }
}

/// Ordered, append-only list of transcript entries.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in display order.
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by handle.
    pub fn get(&self, handle: MessageHandle) -> Option<&TranscriptEntry> {
        self.entries.get(handle.0)
    }

    /// The newest entry.
    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    /// Append a user entry. The text is stored verbatim.
    pub fn append_user_message(&mut self, text: impl Into<String>) -> MessageHandle {
        self.push(ChatMessage::user(text), EntryStatus::Complete)
    }

    /// Append an empty assistant entry marked as loading.
    pub fn append_placeholder_assistant_message(&mut self) -> MessageHandle {
        self.push(ChatMessage::assistant(String::new()), EntryStatus::Pending)
    }

    /// Replace a placeholder's text with the reply and clear its loading marker.
    pub fn resolve_assistant_message(
        &mut self,
        handle: MessageHandle,
        text: impl Into<String>,
    ) -> Result<(), TranscriptError> {
        self.settle(handle, text.into(), EntryStatus::Complete)
    }

    /// Replace a placeholder's text with an error indication.
    pub fn fail_assistant_message(
        &mut self,
        handle: MessageHandle,
        text: impl Into<String>,
    ) -> Result<(), TranscriptError> {
        self.settle(handle, text.into(), EntryStatus::Failed)
    }

    fn push(&mut self, message: ChatMessage, status: EntryStatus) -> MessageHandle {
        self.entries.push(TranscriptEntry { message, status });
        MessageHandle(self.entries.len() - 1)
    }

    fn settle(
        &mut self,
        handle: MessageHandle,
        text: String,
        status: EntryStatus,
    ) -> Result<(), TranscriptError> {
        let entry = self
            .entries
            .get_mut(handle.0)
            .ok_or(TranscriptError::UnknownHandle(handle.0))?;

        if entry.message.role != Role::Assistant || !entry.is_pending() {
            warn!(index = handle.0, "placeholder already settled or not a placeholder");
            return Err(TranscriptError::NotPending(handle.0));
        }

        entry.message.content = text;
        entry.status = status;
        Ok(())
    }
}

/// Errors from transcript mutation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TranscriptError {
    /// Handle does not refer to an entry.
    #[error("No transcript entry at index {0}")]
    UnknownHandle(usize),

    /// Entry is not an unresolved assistant placeholder.
    #[error("Transcript entry {0} is not a pending placeholder")]
    NotPending(usize),
}
