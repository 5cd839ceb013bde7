//! The chat screen: conversation pane plus status bar.

use askchat_engine::ControllerState;
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

use super::Screen;
use crate::app::App;
use crate::conversation::ConversationPane;
use crate::ui::layout::main_layout;
use crate::ui::theme::{Palette, Styles};
use crate::ui::widgets::{KeyHint, StatusBar};

const IDLE_HINTS: [KeyHint; 3] = [
    KeyHint::new("Enter", "Send"),
    KeyHint::new("F1", "Help"),
    KeyHint::new("^C", "Quit"),
];

const AWAITING_HINTS: [KeyHint; 2] = [KeyHint::new("PgUp", "Scroll"), KeyHint::new("^C", "Quit")];

pub struct ChatScreen;

impl Screen for ChatScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let (main_area, status_area) = main_layout(area);
        let controller = &app.controller;

        ConversationPane::new(
            controller.transcript(),
            &app.transcript_view,
            &app.input_state,
            controller.state(),
        )
        .tick(app.tick)
        .render(main_area, buf);

        let state = controller.state();
        let (hints, mode_style) = match state {
            ControllerState::Idle => (IDLE_HINTS.to_vec(), None),
            ControllerState::AwaitingReply { .. } => (
                AWAITING_HINTS.to_vec(),
                Some(Styles::default().bg(Palette::WARNING).fg(Palette::BG)),
            ),
            ControllerState::Error { .. } => (
                IDLE_HINTS.to_vec(),
                Some(Styles::default().bg(Palette::ERROR).fg(Palette::BG)),
            ),
        };

        let mut hints = hints;
        if !app.transcript_view.is_following() {
            hints.insert(0, KeyHint::new("End", "Latest"));
        }

        let mut bar = StatusBar::new(state.label()).hints(hints);
        if let Some(style) = mode_style {
            bar = bar.mode_style(style);
        }
        bar = match controller.last_error() {
            Some(error) => bar.right(error, Styles::error().bg(Palette::STATUS_BG)),
            None => bar.right(&app.endpoint, Styles::status_bar()),
        };
        bar.render(status_area, buf);
    }
}
