//! Submission controller: the state machine wiring transcript and client.
//!
//! ```text
//!            begin (non-blank)            complete(Ok)
//!   Idle ──────────────────────▶ AwaitingReply ──────────▶ Idle
//!    ▲                               │
//!    │ begin (non-blank)             │ complete(Err)
//!    └──────────────── Error ◀───────┘
//! ```
//!
//! At most one exchange is in flight: `begin` refuses while a reply is
//! pending, whatever the front end does with its input widget.

use crate::client::{ConversationClient, ExchangeError, ExchangeRequest, ExchangeResponse};
use crate::session::ConversationSession;
use crate::transcript::{MessageHandle, Transcript};
use tracing::{debug, error, warn};

/// State of the submission controller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ControllerState {
    /// Ready for a submission.
    #[default]
    Idle,
    /// An exchange is in flight; submission is disabled.
    AwaitingReply {
        /// Placeholder entry that receives the reply.
        placeholder: MessageHandle,
    },
    /// The last exchange failed; submission is enabled again.
    Error {
        /// Description of the failure.
        message: String,
    },
}

impl ControllerState {
    /// Short label for status displays.
    pub fn label(&self) -> &'static str {
        match self {
            ControllerState::Idle => "Ready",
            ControllerState::AwaitingReply { .. } => "Waiting for reply",
            ControllerState::Error { .. } => "Error",
        }
    }
}

/// An exchange started by [`SubmissionController::begin`] that the caller must run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingExchange {
    /// Request to send.
    pub request: ExchangeRequest,
    /// Placeholder entry that will receive the reply.
    pub placeholder: MessageHandle,
}

/// Owns the transcript and the session identifier and enforces the
/// single-outstanding-exchange rule.
#[derive(Debug, Default)]
pub struct SubmissionController {
    state: ControllerState,
    session: ConversationSession,
    transcript: Transcript,
    exchanges_started: u64,
}

impl SubmissionController {
    /// Create a controller with an empty transcript and session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a controller resuming an existing session.
    pub fn with_session(session: ConversationSession) -> Self {
        Self {
            session,
            ..Self::default()
        }
    }

    /// Current state.
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Current session identifier.
    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    /// The conversation transcript.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Number of exchanges started since creation.
    pub fn exchanges_started(&self) -> u64 {
        self.exchanges_started
    }

    /// Whether a new submission would be accepted.
    pub fn can_submit(&self) -> bool {
        !self.is_awaiting_reply()
    }

    /// Whether an exchange is in flight.
    pub fn is_awaiting_reply(&self) -> bool {
        matches!(self.state, ControllerState::AwaitingReply { .. })
    }

    /// Last failure, if the controller is in the error state.
    pub fn last_error(&self) -> Option<&str> {
        match &self.state {
            ControllerState::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Start a submission.
    ///
    /// Appends the user message and a placeholder, then returns the request
    /// to send. Returns `None` without touching the transcript when the input
    /// is blank or a reply is still pending.
    pub fn begin(&mut self, input: &str) -> Option<PendingExchange> {
        if input.trim().is_empty() {
            debug!("ignoring blank submission");
            return None;
        }
        if self.is_awaiting_reply() {
            debug!("ignoring submission while awaiting reply");
            return None;
        }

        self.transcript.append_user_message(input);
        let placeholder = self.transcript.append_placeholder_assistant_message();
        self.state = ControllerState::AwaitingReply { placeholder };
        self.exchanges_started += 1;

        debug!(
            exchange = self.exchanges_started,
            session = %self.session,
            "awaiting reply"
        );

        Some(PendingExchange {
            request: ExchangeRequest::new(input, self.session.clone()),
            placeholder,
        })
    }

    /// Settle the in-flight exchange.
    ///
    /// Returns `false` and changes nothing when no exchange is pending.
    pub fn complete(&mut self, outcome: Result<ExchangeResponse, ExchangeError>) -> bool {
        let ControllerState::AwaitingReply { placeholder } = self.state else {
            warn!("exchange completed with no reply pending");
            return false;
        };

        match outcome {
            Ok(response) => {
                if let Err(e) = self
                    .transcript
                    .resolve_assistant_message(placeholder, response.message)
                {
                    warn!("could not resolve placeholder: {e}");
                }
                self.session = response.session;
                self.state = ControllerState::Idle;
                debug!(session = %self.session, "reply received");
            }
            Err(e) => {
                let message = e.to_string();
                error!("exchange failed: {message}");
                if let Err(e) = self
                    .transcript
                    .fail_assistant_message(placeholder, format!("Error: {message}"))
                {
                    warn!("could not mark placeholder failed: {e}");
                }
                self.state = ControllerState::Error { message };
            }
        }
        true
    }

    /// Run a whole submission against a client: begin, exchange, complete.
    ///
    /// Returns `None` when the submission was refused.
    pub async fn submit<C>(&mut self, client: &C, input: &str) -> Option<&ControllerState>
    where
        C: ConversationClient + ?Sized,
    {
        let pending = self.begin(input)?;
        let outcome = client
            .exchange(&pending.request.message, &pending.request.session)
            .await;
        self.complete(outcome);
        Some(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Role;
    use crate::transcript::EntryStatus;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Client replying from a fixed script and recording every call.
    struct ScriptedClient {
        replies: Mutex<Vec<Result<ExchangeResponse, ExchangeError>>>,
        calls: Mutex<Vec<ExchangeRequest>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Result<ExchangeResponse, ExchangeError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().rev().collect()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<ExchangeRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ConversationClient for ScriptedClient {
        async fn exchange(
            &self,
            message: &str,
            session: &ConversationSession,
        ) -> Result<ExchangeResponse, ExchangeError> {
            self.calls
                .lock()
                .unwrap()
                .push(ExchangeRequest::new(message, session.clone()));
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(ExchangeError::MissingMessage))
        }
    }

    fn reply(message: &str, session: &str) -> Result<ExchangeResponse, ExchangeError> {
        Ok(ExchangeResponse {
            message: message.into(),
            session: session.into(),
        })
    }

    #[test]
    fn test_begin_appends_user_then_placeholder() {
        let mut controller = SubmissionController::new();
        let pending = controller.begin("hello").unwrap();

        let entries = controller.transcript().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message.role, Role::User);
        assert_eq!(entries[0].message.content, "hello");
        assert_eq!(entries[1].status, EntryStatus::Pending);
        assert_eq!(pending.placeholder.index(), 1);
        assert_eq!(pending.request.message, "hello");
        assert!(pending.request.session.is_empty());
        assert!(controller.is_awaiting_reply());
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let mut controller = SubmissionController::new();
        for input in ["", " ", "\t\n", "   \n  "] {
            assert!(controller.begin(input).is_none());
        }
        assert!(controller.transcript().is_empty());
        assert_eq!(controller.state(), &ControllerState::Idle);
        assert_eq!(controller.exchanges_started(), 0);
    }

    #[test]
    fn test_submission_while_awaiting_is_noop() {
        let mut controller = SubmissionController::new();
        assert!(controller.begin("a").is_some());
        assert!(controller.begin("b").is_none());
        assert!(controller.begin("c").is_none());

        assert_eq!(controller.transcript().len(), 2);
        assert_eq!(controller.exchanges_started(), 1);
        assert!(!controller.can_submit());
    }

    #[test]
    fn test_complete_success_resolves_and_stores_session() {
        let mut controller = SubmissionController::new();
        let pending = controller.begin("hello").unwrap();

        assert!(controller.complete(reply("Hi there!", "abc123")));

        let entry = controller.transcript().get(pending.placeholder).unwrap();
        assert_eq!(entry.message.content, "Hi there!");
        assert_eq!(entry.status, EntryStatus::Complete);
        assert_eq!(controller.session().as_str(), "abc123");
        assert_eq!(controller.state(), &ControllerState::Idle);
        assert!(controller.can_submit());
    }

    #[test]
    fn test_complete_failure_enters_error_state() {
        let mut controller = SubmissionController::with_session("s1".into());
        let pending = controller.begin("hello").unwrap();

        assert!(controller.complete(Err(ExchangeError::Timeout(30))));

        let entry = controller.transcript().get(pending.placeholder).unwrap();
        assert_eq!(entry.status, EntryStatus::Failed);
        assert_eq!(entry.message.content, "Error: No reply after 30s");
        assert_eq!(controller.last_error(), Some("No reply after 30s"));
        assert_eq!(controller.session().as_str(), "s1");
        assert!(controller.can_submit());
    }

    #[test]
    fn test_complete_without_pending_is_ignored() {
        let mut controller = SubmissionController::new();
        assert!(!controller.complete(reply("stray", "x")));
        assert!(controller.transcript().is_empty());
        assert!(controller.session().is_empty());
    }

    #[test]
    fn test_error_state_accepts_next_submission() {
        let mut controller = SubmissionController::new();
        controller.begin("first").unwrap();
        controller.complete(Err(ExchangeError::MissingMessage));

        let pending = controller.begin("second").unwrap();
        assert_eq!(pending.placeholder.index(), 3);
        assert!(controller.is_awaiting_reply());
        assert_eq!(controller.last_error(), None);
    }

    #[tokio::test]
    async fn test_submit_hello_scenario() {
        let client = ScriptedClient::new(vec![reply("Hi there!", "abc123")]);
        let mut controller = SubmissionController::new();

        let state = controller.submit(&client, "hello").await.cloned();
        assert_eq!(state, Some(ControllerState::Idle));

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].message, "hello");
        assert_eq!(calls[0].session.as_str(), "");

        let entries = controller.transcript().entries();
        assert_eq!(entries[0].message.content, "hello");
        assert_eq!(entries[1].message.content, "Hi there!");
        assert_eq!(controller.session().as_str(), "abc123");
    }

    #[tokio::test]
    async fn test_submit_threads_session_through_exchanges() {
        let client = ScriptedClient::new(vec![reply("one", "abc123"), reply("two", "abc123")]);
        let mut controller = SubmissionController::new();

        controller.submit(&client, "first").await;
        controller.submit(&client, "second").await;

        let calls = client.calls();
        assert_eq!(calls[0].session.as_str(), "");
        assert_eq!(calls[1].session.as_str(), "abc123");
        assert_eq!(controller.transcript().len(), 4);
    }

    #[tokio::test]
    async fn test_submit_blank_never_calls_client() {
        let client = ScriptedClient::new(vec![]);
        let mut controller = SubmissionController::new();

        assert!(controller.submit(&client, "   ").await.is_none());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_submit_failure_recovers() {
        let client = ScriptedClient::new(vec![
            Err(ExchangeError::Rejected("model failed to respond".into())),
            reply("back online", "s2"),
        ]);
        let mut controller = SubmissionController::new();

        let state = controller.submit(&client, "hello").await.cloned();
        assert!(matches!(state, Some(ControllerState::Error { .. })));
        assert!(controller.transcript().entries()[1].is_failed());

        let state = controller.submit(&client, "retry").await.cloned();
        assert_eq!(state, Some(ControllerState::Idle));
        assert_eq!(controller.transcript().entries()[3].message.content, "back online");
    }
}
