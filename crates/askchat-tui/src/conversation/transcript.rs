//! Transcript rendering.

use askchat_engine::{Role, Transcript, TranscriptEntry};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use super::state::TranscriptViewState;
use crate::text::wrap_text;
use crate::ui::theme::{spinner_frame, Styles, Symbols};

const BODY_INDENT: &str = "  ";

const EMPTY_HINT: &str = "No messages yet. Say hello!";

fn header(entry: &TranscriptEntry) -> Line<'static> {
    let (symbol, style) = match entry.message.role {
        Role::User => (Symbols::USER, Styles::highlight()),
        Role::Assistant => (Symbols::ASSISTANT, Styles::assistant()),
    };
    Line::from(Span::styled(
        format!("{symbol} {}", entry.message.role.label()),
        style,
    ))
}

fn body(entry: &TranscriptEntry, width: usize, tick: usize) -> Vec<Line<'static>> {
    if entry.is_pending() {
        return vec![Line::from(Span::styled(
            format!("{BODY_INDENT}{} thinking...", spinner_frame(tick)),
            Styles::dim(),
        ))];
    }

    let style: Style = if entry.is_failed() {
        Styles::error()
    } else {
        Styles::default()
    };
    let wrap_width = width.saturating_sub(BODY_INDENT.len()).max(1);
    wrap_text(&entry.message.content, wrap_width)
        .into_iter()
        .map(|line| Line::from(Span::styled(format!("{BODY_INDENT}{line}"), style)))
        .collect()
}

/// Lay out the whole transcript as display lines for the given width.
///
/// Every entry gets a speaker header and an indented body; entries are
/// separated by a blank line.
pub fn transcript_lines(transcript: &Transcript, width: usize, tick: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, entry) in transcript.entries().iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        lines.push(header(entry));
        lines.extend(body(entry, width, tick));
    }
    lines
}

/// Scrollable transcript view.
pub struct TranscriptWidget<'a> {
    transcript: &'a Transcript,
    view: &'a TranscriptViewState,
    tick: usize,
}

impl<'a> TranscriptWidget<'a> {
    pub fn new(transcript: &'a Transcript, view: &'a TranscriptViewState) -> Self {
        Self {
            transcript,
            view,
            tick: 0,
        }
    }

    /// Animation frame for pending replies.
    #[must_use]
    pub fn tick(mut self, tick: usize) -> Self {
        self.tick = tick;
        self
    }
}

impl Widget for TranscriptWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        if self.transcript.is_empty() {
            self.view.record_viewport(0, area.height as usize);
            Paragraph::new(Line::from(Span::styled(EMPTY_HINT, Styles::dim())))
                .render(area, buf);
            return;
        }

        let lines = transcript_lines(self.transcript, area.width as usize, self.tick);
        let height = area.height as usize;
        self.view.record_viewport(lines.len(), height);

        let end = lines.len() - self.view.scroll_back();
        let start = end.saturating_sub(height);
        let visible: Vec<Line> = lines[start..end].to_vec();

        Paragraph::new(visible)
            .style(Styles::default())
            .render(area, buf);
    }
}
