//! Headless mode for the askchat TUI.
//!
//! Runs the real app loop against a test backend so the whole
//! key-to-render path can be driven from tests. Input is sent over a
//! channel and the state is published after every render.

use crate::app::{settle_finished_exchange, spawn_exchange, App, ExchangeTask};
use crate::event::Action;
use askchat_engine::{Config, ControllerState, ConversationClient, EntryStatus, Role};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Default terminal dimensions for headless mode.
pub const DEFAULT_WIDTH: u16 = 80;
pub const DEFAULT_HEIGHT: u16 = 24;

/// Input delivered to a headless instance.
#[derive(Debug, Clone)]
pub enum HeadlessInput {
    Key(KeyEvent),
    Paste(String),
    Action(Action),
}

/// State captured from the headless TUI after each render.
#[derive(Debug, Clone, Default)]
pub struct HeadlessState {
    /// Text contents of the terminal buffer.
    pub screen_contents: String,
    pub should_quit: bool,
    pub show_help: bool,
    pub controller_state: ControllerState,
    pub input_enabled: bool,
    /// Current contents of the message input.
    pub input: String,
    /// Every transcript entry as (role, text, status).
    pub transcript: Vec<(Role, String, EntryStatus)>,
    pub session: String,
    pub exchanges_started: u64,
    /// Inputs handled so far.
    pub events_processed: usize,
}

impl HeadlessState {
    fn capture(app: &App, screen_contents: String, events_processed: usize) -> Self {
        let controller = &app.controller;
        Self {
            screen_contents,
            should_quit: app.should_quit,
            show_help: app.show_help,
            controller_state: controller.state().clone(),
            input_enabled: app.input_enabled(),
            input: app.input_state.content().to_string(),
            transcript: controller
                .transcript()
                .entries()
                .iter()
                .map(|e| (e.message.role, e.message.content.clone(), e.status))
                .collect(),
            session: controller.session().to_string(),
            exchanges_started: controller.exchanges_started(),
            events_processed,
        }
    }
}

/// Handle to control a headless TUI instance.
pub struct HeadlessHandle {
    input_tx: mpsc::UnboundedSender<HeadlessInput>,
    state_rx: watch::Receiver<HeadlessState>,
}

impl HeadlessHandle {
    /// Send a key press. Returns `true` if it was delivered.
    pub fn send_key(&self, key: KeyEvent) -> bool {
        self.input_tx.send(HeadlessInput::Key(key)).is_ok()
    }

    /// Send a plain key with no modifiers.
    pub fn press(&self, code: KeyCode) -> bool {
        self.send_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    pub fn send_action(&self, action: Action) -> bool {
        self.input_tx.send(HeadlessInput::Action(action)).is_ok()
    }

    pub fn paste(&self, text: &str) -> bool {
        self.input_tx
            .send(HeadlessInput::Paste(text.to_string()))
            .is_ok()
    }

    /// Type text one key at a time.
    pub fn type_text(&self, text: &str) -> bool {
        text.chars().all(|c| self.press(KeyCode::Char(c)))
    }

    /// Get the current state of the TUI.
    pub fn state(&self) -> HeadlessState {
        self.state_rx.borrow().clone()
    }

    /// Wait until a condition is met on the state.
    ///
    /// Returns the state when the condition is met, or `None` if timed out.
    pub async fn wait_for<F>(&mut self, condition: F, timeout: Duration) -> Option<HeadlessState>
    where
        F: Fn(&HeadlessState) -> bool,
    {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let state = self.state();
            if condition(&state) {
                return Some(state);
            }

            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return None;
            }

            match tokio::time::timeout(remaining, self.state_rx.changed()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => return condition(&self.state()).then(|| self.state()),
                Err(_) => return None,
            }
        }
    }

    /// Wait for specific text to appear on screen.
    pub async fn wait_for_text(&mut self, text: &str, timeout: Duration) -> Option<HeadlessState> {
        self.wait_for(|s| s.screen_contents.contains(text), timeout)
            .await
    }

    /// Wait until `count` inputs have been handled.
    pub async fn wait_for_events(
        &mut self,
        count: usize,
        timeout: Duration,
    ) -> Option<HeadlessState> {
        self.wait_for(|s| s.events_processed >= count, timeout)
            .await
    }

    pub fn has_quit(&self) -> bool {
        self.state().should_quit
    }
}

/// Configuration for headless mode.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    pub width: u16,
    pub height: u16,
    pub tick_rate_ms: u64,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            tick_rate_ms: 20,
        }
    }
}

/// Run the TUI in headless mode against the given client.
///
/// Returns a handle to control the TUI and a join handle for the loop.
pub fn run_tui_headless(
    client: Arc<dyn ConversationClient>,
    config: &Config,
    headless: HeadlessConfig,
) -> (HeadlessHandle, JoinHandle<Result<(), String>>) {
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(HeadlessState::default());
    let app = App::new(config);

    let task = tokio::spawn(async move {
        run_headless_loop(app, client, headless, input_rx, state_tx)
            .await
            .map_err(|e| e.to_string())
    });

    (HeadlessHandle { input_tx, state_rx }, task)
}

async fn run_headless_loop(
    mut app: App,
    client: Arc<dyn ConversationClient>,
    config: HeadlessConfig,
    mut input_rx: mpsc::UnboundedReceiver<HeadlessInput>,
    state_tx: watch::Sender<HeadlessState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let backend = TestBackend::new(config.width, config.height);
    let mut terminal = Terminal::new(backend)?;
    let tick_duration = Duration::from_millis(config.tick_rate_ms);

    let mut exchange: Option<ExchangeTask> = None;
    let mut events_processed = 0;

    loop {
        settle_finished_exchange(&mut app, &mut exchange).await;

        terminal.draw(|frame| crate::draw(&app, frame.area(), frame.buffer_mut()))?;
        let screen_contents = buffer_to_string(terminal.backend().buffer());
        state_tx.send_replace(HeadlessState::capture(&app, screen_contents, events_processed));

        if app.should_quit {
            if let Some(task) = exchange.take() {
                task.abort();
            }
            break;
        }

        let input = tokio::select! {
            input = input_rx.recv() => match input {
                Some(input) => input,
                None => break,
            },
            () = tokio::time::sleep(tick_duration) => {
                app.tick();
                continue;
            }
        };

        events_processed += 1;
        match input {
            HeadlessInput::Key(key) => {
                if let Some(pending) = app.handle_key(key) {
                    exchange = Some(spawn_exchange(&client, &pending));
                }
            }
            HeadlessInput::Paste(text) => app.handle_paste(&text),
            HeadlessInput::Action(action) => app.handle_action(action),
        }
    }

    Ok(())
}

/// Convert a terminal buffer to text, one line per row with trailing
/// spaces trimmed.
pub fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut result = String::new();

    for y in area.y..area.y + area.height {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buffer.cell((x, y)) {
                result.push_str(cell.symbol());
            }
        }
        while result.ends_with(' ') {
            result.pop();
        }
        result.push('\n');
    }

    if result.ends_with('\n') {
        result.pop();
    }

    result
}
