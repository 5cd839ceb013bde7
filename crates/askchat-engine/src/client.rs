//! Conversation client: one request/reply exchange with the assistant endpoint.
//!
//! The wire contract is a JSON `POST` to the `ask` path:
//!
//! ```text
//! request:  {"message": "hello", "session": ""}
//! response: {"message": "Hi there!", "session": "abc123"}
//! failure:  {"error": "request message is empty"}
//! ```
//!
//! The session in the decoded body is authoritative. A body without a
//! session keeps the caller's current one.

use crate::config::Config;
use crate::session::ConversationSession;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Body of one exchange request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRequest {
    /// The user's message.
    pub message: String,
    /// Current session identifier (empty on the first exchange).
    pub session: ConversationSession,
}

impl ExchangeRequest {
    /// Build a request for a message in the given session.
    pub fn new(message: impl Into<String>, session: ConversationSession) -> Self {
        Self {
            message: message.into(),
            session,
        }
    }
}

/// Successful result of one exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeResponse {
    /// The assistant's reply text.
    pub message: String,
    /// Session identifier to send with the next exchange.
    pub session: ConversationSession,
}

/// Raw reply body as sent by the server. Empty fields are omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AskReply {
    /// Assistant reply text.
    #[serde(default)]
    pub message: Option<String>,
    /// Session identifier assigned or confirmed by the server.
    #[serde(default)]
    pub session: Option<String>,
    /// Application-level error reported by the server.
    #[serde(default)]
    pub error: Option<String>,
}

impl AskReply {
    fn error_text(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }

    /// Turn a successful (2xx) body into an exchange response.
    pub fn into_response(
        self,
        current: &ConversationSession,
    ) -> Result<ExchangeResponse, ExchangeError> {
        if let Some(error) = self.error_text() {
            return Err(ExchangeError::Rejected(error.to_string()));
        }
        let message = self.message.ok_or(ExchangeError::MissingMessage)?;
        let session = match self.session {
            Some(id) if !id.is_empty() => ConversationSession::from(id),
            _ => current.clone(),
        };
        Ok(ExchangeResponse { message, session })
    }
}

/// Decode a reply body given its HTTP status.
pub fn decode_reply(
    status: StatusCode,
    body: &str,
    current: &ConversationSession,
) -> Result<ExchangeResponse, ExchangeError> {
    if !status.is_success() {
        let message = serde_json::from_str::<AskReply>(body)
            .ok()
            .and_then(|reply| reply.error_text().map(str::to_string))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string()
            });
        return Err(ExchangeError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let reply: AskReply = serde_json::from_str(body).map_err(ExchangeError::Decode)?;
    reply.into_response(current)
}

/// Anything that can perform an exchange with the assistant.
#[async_trait]
pub trait ConversationClient: Send + Sync {
    /// Send one message in a session and wait for the reply.
    async fn exchange(
        &self,
        message: &str,
        session: &ConversationSession,
    ) -> Result<ExchangeResponse, ExchangeError>;
}

/// HTTP implementation of [`ConversationClient`].
#[derive(Debug, Clone)]
pub struct HttpConversationClient {
    client: Client,
    url: Url,
    timeout: Option<Duration>,
}

impl HttpConversationClient {
    /// Create a client for `ask_path` resolved against `endpoint`.
    ///
    /// Resolution follows URL reference rules, so `http://host/chat/` with
    /// `ask` targets `http://host/chat/ask`.
    pub fn new(endpoint: &str, ask_path: &str) -> Result<Self, ExchangeError> {
        let base = Url::parse(endpoint)
            .map_err(|e| ExchangeError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        let url = base
            .join(ask_path)
            .map_err(|e| ExchangeError::InvalidEndpoint(format!("{endpoint} + {ask_path}: {e}")))?;

        let client = Client::builder().build().map_err(ExchangeError::Transport)?;

        Ok(Self {
            client,
            url,
            timeout: None,
        })
    }

    /// Create a client from configuration.
    pub fn from_config(config: &Config) -> Result<Self, ExchangeError> {
        Ok(Self::new(&config.endpoint, &config.ask_path)?.with_timeout(config.timeout()))
    }

    /// Set the per-request timeout (`None` waits indefinitely).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The resolved exchange URL.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl ConversationClient for HttpConversationClient {
    async fn exchange(
        &self,
        message: &str,
        session: &ConversationSession,
    ) -> Result<ExchangeResponse, ExchangeError> {
        let request = ExchangeRequest::new(message, session.clone());
        debug!(url = %self.url, session = %session, "sending exchange");

        let mut builder = self.client.post(self.url.clone()).json(&request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_transport(e))?;

        let result = decode_reply(status, &body, session);
        if let Ok(reply) = &result {
            info!(
                status = status.as_u16(),
                session = %reply.session,
                "exchange completed"
            );
        }
        result
    }
}

impl HttpConversationClient {
    fn map_transport(&self, err: reqwest::Error) -> ExchangeError {
        match self.timeout {
            Some(timeout) if err.is_timeout() => ExchangeError::Timeout(timeout.as_secs()),
            _ => ExchangeError::Transport(err),
        }
    }
}

/// Errors that can occur during an exchange.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// Endpoint URL could not be parsed or joined with the ask path.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Connection failure or unreadable response.
    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// No reply within the configured timeout.
    #[error("No reply after {0}s")]
    Timeout(u64),

    /// Non-2xx reply.
    #[error("Server returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server error text, or the status reason.
        message: String,
    },

    /// Reply body is not valid JSON of the expected shape.
    #[error("Malformed reply: {0}")]
    Decode(#[source] serde_json::Error),

    /// Server accepted the request but reported an error.
    #[error("Assistant rejected the message: {0}")]
    Rejected(String),

    /// Reply carries no message.
    #[error("Reply has no message")]
    MissingMessage,

    /// The task running the exchange stopped before it produced an outcome.
    #[error("Exchange interrupted: {0}")]
    Interrupted(String),
}
