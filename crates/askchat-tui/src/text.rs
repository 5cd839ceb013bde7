//! Text measuring and wrapping helpers.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: char = '\u{2026}';

/// Visual width of a string in terminal cells.
pub fn visual_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate a string to fit within `max_width` cells, ending with an
/// ellipsis when anything was cut.
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if visual_width(s) <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let target = max_width - 1;
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > target {
            break;
        }
        result.push(ch);
        width += ch_width;
    }
    result.push(ELLIPSIS);
    result
}

/// Wrap text to `width` columns.
///
/// Each source line is wrapped on its own, so explicit line breaks and
/// blank lines in a message survive.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return text.lines().map(str::to_string).collect();
    }

    let mut out = Vec::new();
    for line in text.split('\n') {
        if line.trim().is_empty() {
            out.push(String::new());
            continue;
        }
        out.extend(
            textwrap::wrap(line, width)
                .into_iter()
                .map(std::borrow::Cow::into_owned),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visual_width() {
        assert_eq!(visual_width("hello"), 5);
        assert_eq!(visual_width(""), 0);
        assert_eq!(visual_width("\u{4f60}\u{597d}"), 4);
    }

    #[test]
    fn test_truncate_fits() {
        assert_eq!(truncate_to_width("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_adds_ellipsis() {
        assert_eq!(truncate_to_width("hello world", 6), "hello\u{2026}");
        assert_eq!(truncate_to_width("hello", 0), "");
    }

    #[test]
    fn test_truncate_respects_wide_chars() {
        let result = truncate_to_width("\u{4f60}\u{597d}\u{4e16}\u{754c}", 5);
        assert_eq!(result, "\u{4f60}\u{597d}\u{2026}");
    }

    #[test]
    fn test_wrap_text_long_line() {
        let lines = wrap_text("Hello world this is a long line", 10);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| visual_width(l) <= 10));
    }

    #[test]
    fn test_wrap_text_keeps_line_breaks() {
        let lines = wrap_text("first\n\nthird", 20);
        assert_eq!(lines, vec!["first", "", "third"]);
    }
}
