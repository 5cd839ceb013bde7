//! askchat-engine: Headless core for the askchat assistant client
//!
//! This crate provides everything that does not touch the terminal:
//! - The append-only conversation transcript
//! - The conversation client and its wire contract
//! - The submission state machine that ties the two together
//! - Configuration and the bracketed-ID helpers

pub mod chat;
pub mod client;
pub mod config;
pub mod controller;
pub mod ids;
pub mod session;
pub mod transcript;

// Re-export commonly used types
pub use chat::{ChatMessage, Role};
pub use client::{
    decode_reply, AskReply, ConversationClient, ExchangeError, ExchangeRequest, ExchangeResponse,
    HttpConversationClient,
};
pub use config::{Config, ConfigError};
pub use controller::{ControllerState, PendingExchange, SubmissionController};
pub use ids::{extract_ids, strip_ids};
pub use session::ConversationSession;
pub use transcript::{EntryStatus, MessageHandle, Transcript, TranscriptEntry, TranscriptError};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
