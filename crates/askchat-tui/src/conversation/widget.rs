//! Conversation pane widget.
//!
//! Combines the transcript with the message input at the bottom.

use askchat_engine::{ControllerState, Transcript};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    symbols::line,
    text::Span,
    widgets::{Block, Borders, Widget},
};

use super::placeholder::input_placeholder;
use super::state::TranscriptViewState;
use super::transcript::TranscriptWidget;
use crate::ui::theme::Styles;
use crate::ui::widgets::TextInputState;

/// Fixed height for the input area (in lines).
pub const INPUT_HEIGHT: u16 = 3;

/// Conversation pane.
///
/// ```text
/// ┌ Conversation ─────────────────────────┐
/// │› You                                  │
/// │  hello                                │
/// │                                       │
/// │● Assistant                            │
/// │  | thinking...                        │
/// ├───────────────────────────────────────┤
/// │> Waiting for the assistant...         │
/// └───────────────────────────────────────┘
/// ```
pub struct ConversationPane<'a> {
    transcript: &'a Transcript,
    view: &'a TranscriptViewState,
    input: &'a TextInputState,
    state: &'a ControllerState,
    tick: usize,
}

impl<'a> ConversationPane<'a> {
    pub fn new(
        transcript: &'a Transcript,
        view: &'a TranscriptViewState,
        input: &'a TextInputState,
        state: &'a ControllerState,
    ) -> Self {
        Self {
            transcript,
            view,
            input,
            state,
            tick: 0,
        }
    }

    #[must_use]
    pub fn tick(mut self, tick: usize) -> Self {
        self.tick = tick;
        self
    }

    fn render_divider(area: Rect, buf: &mut Buffer) {
        if area.width < 2 {
            return;
        }
        let style = Styles::border();
        buf[(area.x, area.y)]
            .set_symbol(line::VERTICAL_RIGHT)
            .set_style(style);
        for x in area.x + 1..area.right() - 1 {
            buf[(x, area.y)].set_symbol(line::HORIZONTAL).set_style(style);
        }
        buf[(area.right() - 1, area.y)]
            .set_symbol(line::VERTICAL_LEFT)
            .set_style(style);
    }
}

impl Widget for ConversationPane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.input.is_enabled() {
            Styles::border_active()
        } else {
            Styles::border()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(" Conversation ", Styles::title()));
        let inner = block.inner(area);
        block.render(area, buf);

        // Leave room for the divider and the input.
        if inner.height <= INPUT_HEIGHT {
            self.input
                .widget()
                .placeholder(input_placeholder(self.state))
                .render(inner, buf);
            return;
        }

        let transcript_height = inner.height - INPUT_HEIGHT;
        let transcript_area = Rect::new(inner.x, inner.y, inner.width, transcript_height);
        let divider_y = inner.y + transcript_height;
        let input_area = Rect::new(inner.x, divider_y + 1, inner.width, INPUT_HEIGHT - 1);

        TranscriptWidget::new(self.transcript, self.view)
            .tick(self.tick)
            .render(transcript_area, buf);

        Self::render_divider(Rect::new(area.x, divider_y, area.width, 1), buf);

        self.input
            .widget()
            .placeholder(input_placeholder(self.state))
            .render(input_area, buf);
    }
}
