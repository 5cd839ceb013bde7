//! Multi-line message input.

use crate::ui::theme::Styles;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

const PROMPT: &str = "> ";

/// Render-side view of a [`TextInputState`].
#[derive(Debug, Clone)]
pub struct TextInput<'a> {
    content: &'a str,
    cursor: usize,
    enabled: bool,
    placeholder: Option<&'a str>,
}

impl<'a> TextInput<'a> {
    #[must_use]
    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    fn text_style(&self) -> Style {
        if self.enabled {
            Styles::default()
        } else {
            Styles::dim()
        }
    }
}

impl Widget for TextInput<'_> {
    fn render(self, inner: Rect, buf: &mut Buffer) {
        if inner.height < 1 || inner.width < 1 {
            return;
        }

        let prompt_style = if self.enabled {
            Styles::active()
        } else {
            Styles::dim()
        };

        if self.content.is_empty() {
            let mut spans = vec![Span::styled(PROMPT, prompt_style)];
            if self.enabled {
                spans.push(Span::styled("_", Styles::active()));
            }
            if let Some(placeholder) = self.placeholder {
                spans.push(Span::styled(placeholder, Styles::dim()));
            }
            Paragraph::new(Line::from(spans)).render(inner, buf);
            return;
        }

        let style = self.text_style();
        let indent = " ".repeat(PROMPT.len());
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut cursor_drawn = !self.enabled;

        for (idx, ch) in self.content.chars().enumerate() {
            if !cursor_drawn && idx == self.cursor {
                current.push(if ch == '\n' { '_' } else { '|' });
                cursor_drawn = true;
            }
            if ch == '\n' {
                lines.push(std::mem::take(&mut current));
            } else {
                current.push(ch);
            }
        }
        if !cursor_drawn {
            current.push('_');
        }
        lines.push(current);

        // Keep the line holding the cursor in view.
        let visible = inner.height as usize;
        let cursor_line = self
            .content
            .chars()
            .take(self.cursor)
            .filter(|&c| c == '\n')
            .count();
        let skip = (cursor_line + 1).saturating_sub(visible);

        let rendered: Vec<Line> = lines
            .into_iter()
            .enumerate()
            .skip(skip)
            .map(|(i, text)| {
                let lead = if i == 0 {
                    Span::styled(PROMPT, prompt_style)
                } else {
                    Span::styled(indent.clone(), style)
                };
                Line::from(vec![lead, Span::styled(text, style)])
            })
            .collect();

        Paragraph::new(rendered).style(style).render(inner, buf);
    }
}

/// Editable contents of the message input.
///
/// The cursor is a character index. While disabled, edits are ignored and
/// the content is left untouched.
#[derive(Debug, Clone)]
pub struct TextInputState {
    content: String,
    cursor: usize,
    enabled: bool,
    history: Vec<String>,
    /// Position while browsing history, counted back from the newest entry.
    history_index: Option<usize>,
    saved_input: String,
}

impl Default for TextInputState {
    fn default() -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            enabled: true,
            history: Vec::new(),
            history_index: None,
            saved_input: String::new(),
        }
    }
}

impl TextInputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn byte_offset(&self, char_idx: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_idx)
            .map_or(self.content.len(), |(i, _)| i)
    }

    fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn insert(&mut self, ch: char) {
        if !self.enabled {
            return;
        }
        let at = self.byte_offset(self.cursor);
        self.content.insert(at, ch);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        if !self.enabled {
            return;
        }
        let at = self.byte_offset(self.cursor);
        self.content.insert_str(at, s);
        self.cursor += s.chars().count();
    }

    pub fn backspace(&mut self) {
        if !self.enabled || self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_offset(self.cursor);
        self.content.remove(at);
    }

    pub fn delete(&mut self) {
        if !self.enabled || self.cursor >= self.char_len() {
            return;
        }
        let at = self.byte_offset(self.cursor);
        self.content.remove(at);
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Take the content, recording it in history.
    pub fn submit(&mut self) -> String {
        let content = std::mem::take(&mut self.content);
        self.cursor = 0;
        if !content.trim().is_empty() {
            self.history.push(content.clone());
        }
        self.history_index = None;
        self.saved_input.clear();
        content
    }

    /// Step back to an older submitted message.
    pub fn history_prev(&mut self) {
        if !self.enabled || self.history.is_empty() {
            return;
        }
        let next = match self.history_index {
            None => {
                self.saved_input = self.content.clone();
                0
            }
            Some(i) if i + 1 < self.history.len() => i + 1,
            Some(_) => return,
        };
        self.history_index = Some(next);
        self.content = self.history[self.history.len() - 1 - next].clone();
        self.move_end();
    }

    /// Step forward toward the draft that was being typed.
    pub fn history_next(&mut self) {
        if !self.enabled {
            return;
        }
        match self.history_index {
            None => {}
            Some(0) => {
                self.history_index = None;
                self.content = std::mem::take(&mut self.saved_input);
                self.move_end();
            }
            Some(i) => {
                self.history_index = Some(i - 1);
                self.content = self.history[self.history.len() - i].clone();
                self.move_end();
            }
        }
    }

    pub fn widget(&self) -> TextInput<'_> {
        TextInput {
            content: &self.content,
            cursor: self.cursor,
            enabled: self.enabled,
            placeholder: None,
        }
    }
}
