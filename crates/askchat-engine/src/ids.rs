//! Bracketed identifier tokens in assistant text.
//!
//! Replies from a shopping assistant may reference catalog entries as
//! `[OLJCESPC7Z]` or `[66VCHSJNUP-2]`. These helpers find or remove them.

use regex::Regex;

const ID_PATTERN: &str = r"\[([a-zA-Z0-9-]+)\]";
const STRIP_PATTERN: &str = r"(?m)^\[[a-zA-Z0-9-]+\][ \t]*|[ \t]*\[[a-zA-Z0-9-]+\]";

/// Extract every bracketed identifier from a message, in order of appearance.
pub fn extract_ids(message: &str) -> Vec<String> {
    let Ok(re) = Regex::new(ID_PATTERN) else {
        return Vec::new();
    };
    re.captures_iter(message)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Remove bracketed identifiers from a message.
///
/// Each token takes the spaces before it along, or the spaces after it when
/// it opens a line. All other text is left as it was.
pub fn strip_ids(message: &str) -> String {
    let Ok(re) = Regex::new(STRIP_PATTERN) else {
        return message.to_string();
    };
    re.replace_all(message, "").into_owned()
}
