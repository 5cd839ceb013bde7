//! askchat-tui: Terminal front end for the askchat assistant client
//!
//! This crate provides the TUI layer for askchat, including:
//! - The chat screen (transcript, message input, status bar)
//! - Key handling and the single in-flight exchange task
//! - Headless mode for testing and automation

mod app;
mod conversation;
mod event;
pub mod headless;
mod screens;
#[cfg(test)]
pub mod test_utils;
mod text;
mod ui;

use screens::Screen as ScreenTrait;

pub use app::App;
pub use event::{Action, Event, EventHandler};
pub use askchat_engine;

use app::{settle_finished_exchange, spawn_exchange, ExchangeTask};
use askchat_engine::{Config, ConversationClient};
use crossterm::{
    cursor::Show as ShowCursor,
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, buffer::Buffer, layout::Rect, Terminal};
use std::io::{self, stdout};
use std::sync::Arc;
use tracing::info;

/// Tick rate of the event loop, which also drives the spinner.
const TICK_RATE_MS: u64 = 150;

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            stdout(),
            DisableBracketedPaste,
            DisableMouseCapture,
            LeaveAlternateScreen,
            ShowCursor
        );
    }
}

/// Render the whole UI for the current app state.
pub(crate) fn draw(app: &App, area: Rect, buf: &mut Buffer) {
    screens::ChatScreen.render(app, area, buf);
    if app.show_help {
        screens::render_help_overlay(area, buf);
    }
}

/// Run the TUI application.
///
/// Sets up the terminal, runs the event loop against `client`, and
/// restores the terminal on exit.
pub async fn run_tui(
    client: Arc<dyn ConversationClient>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);
    let mut events = EventHandler::new(TICK_RATE_MS);
    info!(endpoint = %config.endpoint, "chat session started");

    let result = run_loop(&mut terminal, &mut app, &mut events, &client).await;

    terminal.show_cursor()?;
    info!(
        exchanges = app.controller.exchanges_started(),
        "chat session ended"
    );

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
    client: &Arc<dyn ConversationClient>,
) -> Result<(), Box<dyn std::error::Error>> {
    // At most one exchange is ever in flight.
    let mut exchange: Option<ExchangeTask> = None;

    loop {
        terminal.draw(|frame| draw(app, frame.area(), frame.buffer_mut()))?;

        if let Some(event) = events.next().await {
            match event {
                Event::Key(key) => {
                    if let Some(pending) = app.handle_key(key) {
                        exchange = Some(spawn_exchange(client, &pending));
                    }
                }
                Event::Paste(text) => app.handle_paste(&text),
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => app.handle_action(Action::ScrollUp),
                    MouseEventKind::ScrollDown => app.handle_action(Action::ScrollDown),
                    _ => {}
                },
                Event::Tick => app.tick(),
                Event::Resize(_, _) => {}
            }
        }

        settle_finished_exchange(app, &mut exchange).await;

        if app.should_quit {
            if let Some(task) = exchange.take() {
                task.abort();
            }
            break;
        }
    }

    Ok(())
}

/// Get the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tui_version() {
        let version = tui_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }
}
