//! Transcript scroll state.

use std::cell::Cell;

/// Scroll position of the transcript view.
///
/// The position is measured in lines back from the newest line, so zero
/// means the view follows new entries. The widget records the scroll limit
/// and viewport height each time it renders.
#[derive(Debug, Default)]
pub struct TranscriptViewState {
    scroll_back: usize,
    max_scroll: Cell<usize>,
    viewport: Cell<usize>,
}

impl TranscriptViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines hidden below the bottom of the view.
    pub fn scroll_back(&self) -> usize {
        self.scroll_back.min(self.max_scroll.get())
    }

    /// Whether the view sticks to the newest entry.
    pub fn is_following(&self) -> bool {
        self.scroll_back() == 0
    }

    pub fn scroll_up(&mut self, lines: usize) {
        let max = self.max_scroll.get();
        self.scroll_back = (self.scroll_back() + lines).min(max);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_back = self.scroll_back().saturating_sub(lines);
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.page_size());
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.page_size());
    }

    /// Jump back to the newest entry.
    pub fn follow_latest(&mut self) {
        self.scroll_back = 0;
    }

    fn page_size(&self) -> usize {
        self.viewport.get().saturating_sub(1).max(1)
    }

    /// Record the rendered geometry.
    pub(crate) fn record_viewport(&self, total_lines: usize, height: usize) {
        self.max_scroll.set(total_lines.saturating_sub(height));
        self.viewport.set(height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_following() {
        let state = TranscriptViewState::new();
        assert!(state.is_following());
        assert_eq!(state.scroll_back(), 0);
    }

    #[test]
    fn test_scroll_clamped_to_content() {
        let mut state = TranscriptViewState::new();
        state.record_viewport(30, 10);

        state.scroll_up(5);
        assert_eq!(state.scroll_back(), 5);
        assert!(!state.is_following());

        state.scroll_up(100);
        assert_eq!(state.scroll_back(), 20);

        state.scroll_down(100);
        assert!(state.is_following());
    }

    #[test]
    fn test_no_scroll_when_content_fits() {
        let mut state = TranscriptViewState::new();
        state.record_viewport(5, 10);
        state.scroll_up(3);
        assert!(state.is_following());
    }

    #[test]
    fn test_paging_and_follow_latest() {
        let mut state = TranscriptViewState::new();
        state.record_viewport(50, 11);

        state.page_up();
        assert_eq!(state.scroll_back(), 10);
        state.page_up();
        assert_eq!(state.scroll_back(), 20);
        state.page_down();
        assert_eq!(state.scroll_back(), 10);

        state.follow_latest();
        assert!(state.is_following());
    }
}
