//! Test utilities for askchat-tui: fake conversation clients and render
//! helpers.

use crate::app::App;
use askchat_engine::{
    Config, ConversationClient, ConversationSession, ExchangeError, ExchangeRequest,
    ExchangeResponse,
};
use async_trait::async_trait;
use ratatui::{backend::TestBackend, Terminal};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::Semaphore;

pub use crate::headless::buffer_to_string;

/// Default terminal width for tests.
pub const TEST_WIDTH: u16 = 80;

/// Default terminal height for tests.
pub const TEST_HEIGHT: u16 = 24;

type Reply = Result<ExchangeResponse, ExchangeError>;

fn ok_reply(message: &str, session: &str) -> Reply {
    Ok(ExchangeResponse {
        message: message.to_string(),
        session: ConversationSession::from_id(session),
    })
}

/// Client that answers from a fixed script, in order.
///
/// Running out of script fails the exchange.
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<ExchangeRequest>>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Script of successful `(message, session)` replies.
    pub fn replying(replies: Vec<(&str, &str)>) -> Self {
        Self::new(replies.into_iter().map(|(m, s)| ok_reply(m, s)).collect())
    }

    /// Requests received so far.
    pub fn calls(&self) -> Vec<ExchangeRequest> {
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
            .pop_front()
            .unwrap_or(Err(ExchangeError::MissingMessage))
    }
}

/// Client whose replies are held until the test releases them.
pub struct GatedClient {
    gate: Semaphore,
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<ExchangeRequest>>,
}

impl GatedClient {
    pub fn new() -> Self {
        Self {
            gate: Semaphore::new(0),
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Let one waiting exchange finish with this reply.
    pub fn release(&self, message: &str, session: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(ok_reply(message, session));
        self.gate.add_permits(1);
    }

    pub fn calls(&self) -> Vec<ExchangeRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversationClient for GatedClient {
    async fn exchange(
        &self,
        message: &str,
        session: &ConversationSession,
    ) -> Result<ExchangeResponse, ExchangeError> {
        self.calls
            .lock()
            .unwrap()
            .push(ExchangeRequest::new(message, session.clone()));
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| ExchangeError::Interrupted(e.to_string()))?;
        permit.forget();
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ExchangeError::MissingMessage))
    }
}

/// Create a test app with the default configuration.
pub fn create_test_app() -> App {
    App::new(&Config::default())
}

/// Render the full app into a test terminal and return the screen text.
pub fn render_app(app: &App) -> String {
    render_app_sized(app, TEST_WIDTH, TEST_HEIGHT)
}

/// Render the full app at a custom size.
pub fn render_app_sized(app: &App, width: u16, height: u16) -> String {
    let mut terminal =
        Terminal::new(TestBackend::new(width, height)).expect("Failed to create test terminal");
    terminal
        .draw(|frame| crate::draw(app, frame.area(), frame.buffer_mut()))
        .expect("Failed to draw");
    buffer_to_string(terminal.backend().buffer())
}
