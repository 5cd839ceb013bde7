//! Status bar widget.

use crate::text::{truncate_to_width, visual_width};
use crate::ui::theme::{Palette, Styles};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Widget,
};

/// A key hint for the status bar.
#[derive(Debug, Clone)]
pub struct KeyHint {
    pub key: &'static str,
    pub label: &'static str,
}

impl KeyHint {
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self { key, label }
    }
}

/// Status bar shown on the bottom row: controller state, key hints, and a
/// right-aligned note (endpoint or last error).
#[derive(Debug, Clone)]
pub struct StatusBar<'a> {
    mode: &'a str,
    mode_style: Style,
    hints: Vec<KeyHint>,
    right_text: Option<&'a str>,
    right_style: Style,
}

impl<'a> StatusBar<'a> {
    pub fn new(mode: &'a str) -> Self {
        Self {
            mode,
            mode_style: Styles::default().bg(Palette::ACCENT).fg(Palette::BG),
            hints: Vec::new(),
            right_text: None,
            right_style: Styles::status_bar(),
        }
    }

    /// Override the style of the mode badge.
    #[must_use]
    pub fn mode_style(mut self, style: Style) -> Self {
        self.mode_style = style;
        self
    }

    #[must_use]
    pub fn hints(mut self, hints: Vec<KeyHint>) -> Self {
        self.hints = hints;
        self
    }

    /// Set right-aligned text.
    #[must_use]
    pub fn right(mut self, text: &'a str, style: Style) -> Self {
        self.right_text = Some(text);
        self.right_style = style;
        self
    }
}

impl Widget for StatusBar<'_> {
    #[allow(clippy::cast_possible_truncation)]
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 || area.width < 1 {
            return;
        }

        for x in area.x..area.x.saturating_add(area.width) {
            buf[(x, area.y)].set_char(' ').set_bg(Palette::STATUS_BG);
        }

        let mut spans = vec![
            Span::styled(format!(" {} ", self.mode), self.mode_style),
            Span::styled(" ", Styles::status_bar()),
        ];
        for hint in &self.hints {
            spans.push(Span::styled(format!(" {} ", hint.key), Styles::key_hint()));
            spans.push(Span::styled(
                format!(" {} ", hint.label),
                Styles::key_label(),
            ));
        }

        let left_line = Line::from(spans);
        let left_width = left_line.width();
        buf.set_line(area.x, area.y, &left_line, area.width);

        // The note only gets the space the left side leaves over.
        if let Some(text) = self.right_text {
            let available = (area.width as usize).saturating_sub(left_width + 2);
            if available == 0 {
                return;
            }
            let text = truncate_to_width(text, available);
            let width = visual_width(&text) as u16;
            let x = area.x + area.width - width - 1;
            buf.set_string(x, area.y, &text, self.right_style);
        }
    }
}
