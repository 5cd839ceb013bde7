//! Application state and update logic for the askchat TUI.

use crate::conversation::TranscriptViewState;
use crate::event::{is_newline_chord, key_to_action, Action};
use crate::ui::widgets::TextInputState;
use askchat_engine::{
    extract_ids, strip_ids, Config, ConversationClient, ExchangeError, ExchangeResponse,
    PendingExchange, SubmissionController,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Lines moved by a single Up/Down.
const SCROLL_STEP: usize = 1;

/// Background task running one exchange.
pub type ExchangeTask = JoinHandle<Result<ExchangeResponse, ExchangeError>>;

/// Main application state.
pub struct App {
    pub should_quit: bool,
    pub show_help: bool,
    pub controller: SubmissionController,
    pub input_state: TextInputState,
    pub transcript_view: TranscriptViewState,
    /// Endpoint shown in the status bar.
    pub endpoint: String,
    /// Remove bracketed product IDs from replies before display.
    pub strip_product_ids: bool,
    /// Animation counter, advanced on every tick.
    pub tick: usize,
}

impl App {
    pub fn new(config: &Config) -> Self {
        Self {
            should_quit: false,
            show_help: false,
            controller: SubmissionController::new(),
            input_state: TextInputState::new(),
            transcript_view: TranscriptViewState::new(),
            endpoint: config.endpoint.clone(),
            strip_product_ids: config.strip_product_ids,
            tick: 0,
        }
    }

    /// Whether the message input accepts edits and submissions.
    pub fn input_enabled(&self) -> bool {
        self.input_state.is_enabled()
    }

    /// Handle a key press.
    ///
    /// Returns the exchange to run when the key submitted a message.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<PendingExchange> {
        if key.kind == KeyEventKind::Release {
            return None;
        }

        let action = key_to_action(key);
        if self.show_help {
            self.show_help = false;
            if action == Action::Quit {
                self.should_quit = true;
            }
            return None;
        }
        if action == Action::Quit {
            self.should_quit = true;
            return None;
        }

        if !self.input_enabled() {
            self.handle_action(action);
            return None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter if is_newline_chord(key) => self.input_state.insert('\n'),
            KeyCode::Enter => return self.submit(),
            KeyCode::Char('p') if ctrl => self.input_state.history_prev(),
            KeyCode::Char('n') if ctrl => self.input_state.history_next(),
            KeyCode::Char(c) if !ctrl => self.input_state.insert(c),
            KeyCode::Backspace => self.input_state.backspace(),
            KeyCode::Delete => self.input_state.delete(),
            KeyCode::Left => self.input_state.move_left(),
            KeyCode::Right => self.input_state.move_right(),
            KeyCode::Home => self.input_state.move_home(),
            KeyCode::End => {
                self.input_state.move_end();
                self.handle_action(Action::FollowLatest);
            }
            _ => self.handle_action(action),
        }
        None
    }

    /// Insert pasted text into the input.
    pub fn handle_paste(&mut self, text: &str) {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        self.input_state.insert_str(&text);
    }

    /// Submit the current input.
    ///
    /// Blank input is left in place and nothing is sent.
    pub fn submit(&mut self) -> Option<PendingExchange> {
        let pending = self.controller.begin(self.input_state.content())?;
        self.input_state.submit();
        self.input_state.set_enabled(false);
        self.transcript_view.follow_latest();
        info!(
            exchange = self.controller.exchanges_started(),
            "message submitted"
        );
        Some(pending)
    }

    /// Apply the outcome of the in-flight exchange and re-enable input.
    pub fn finish_exchange(&mut self, outcome: Result<ExchangeResponse, ExchangeError>) {
        let outcome = outcome.map(|mut response| {
            if self.strip_product_ids {
                let ids = extract_ids(&response.message);
                if !ids.is_empty() {
                    debug!(?ids, "removing product ids from reply");
                    response.message = strip_ids(&response.message);
                }
            }
            response
        });

        if self.controller.complete(outcome) {
            self.input_state.set_enabled(true);
            self.transcript_view.follow_latest();
        }
    }

    /// Handle a non-editing action.
    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Help => self.show_help = !self.show_help,
            Action::Back => self.show_help = false,
            Action::ScrollUp => self.transcript_view.scroll_up(SCROLL_STEP),
            Action::ScrollDown => self.transcript_view.scroll_down(SCROLL_STEP),
            Action::PageUp => self.transcript_view.page_up(),
            Action::PageDown => self.transcript_view.page_down(),
            Action::FollowLatest => self.transcript_view.follow_latest(),
            Action::None => {}
        }
    }

    /// Advance animations.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }
}

/// Run an exchange on the runtime.
pub fn spawn_exchange(
    client: &Arc<dyn ConversationClient>,
    pending: &PendingExchange,
) -> ExchangeTask {
    let client = Arc::clone(client);
    let request = pending.request.clone();
    tokio::spawn(async move { client.exchange(&request.message, &request.session).await })
}

/// Feed a finished exchange task back into the app.
///
/// Returns `true` when a task was settled. A task that panicked or was
/// cancelled settles as [`ExchangeError::Interrupted`].
pub async fn settle_finished_exchange(app: &mut App, task: &mut Option<ExchangeTask>) -> bool {
    if !task.as_ref().is_some_and(JoinHandle::is_finished) {
        return false;
    }
    let Some(handle) = task.take() else {
        return false;
    };
    let outcome = match handle.await {
        Ok(outcome) => outcome,
        Err(e) => Err(ExchangeError::Interrupted(e.to_string())),
    };
    app.finish_exchange(outcome);
    true
}
