use std::sync::LazyLock;

use regex::Regex;

static TAG_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"<[^>]*>").ok());

/// Strips tag-like markup and caps the value at `max_chars` characters.
///
/// This is a cleanup heuristic for values pulled from a URL. It does not make
/// a value safe to inject as HTML.
#[must_use]
pub fn sanitize_value(raw: &str, max_chars: usize) -> String {
    let stripped = match TAG_PATTERN.as_ref() {
        Some(pattern) => pattern.replace_all(raw, ""),
        None => raw.into(),
    };
    truncate_chars(&stripped, max_chars)
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((cut, _)) => value[..cut].to_string(),
        None => value.to_string(),
    }
}
