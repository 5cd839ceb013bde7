//! Conversation pane.
//!
//! The main area of the chat screen:
//! - Transcript of the session (scrollable, follows the newest entry)
//! - Message input (disabled while a reply is outstanding)

mod placeholder;
mod state;
mod transcript;
mod widget;

pub use state::TranscriptViewState;
pub use widget::ConversationPane;
