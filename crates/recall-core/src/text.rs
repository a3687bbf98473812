//! Small text helpers for display and logging.

/// Truncate a string to at most `max_chars` characters.
///
/// Operates on char counts, so multi-byte text never splits mid-character.
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &s[..byte_index],
        None => s,
    }
}

/// One-line preview of arbitrary text for log output.
///
/// Newlines collapse to spaces and the result is capped at `max_chars`
/// characters with a trailing ellipsis when shortened.
#[must_use]
pub fn preview(s: &str, max_chars: usize) -> String {
    let flat = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        format!("{}…", truncate_chars(&flat, max_chars))
    }
}

/// Clean a piece of memory text for use as a short display title.
///
/// Strips quote and asterisk markup, collapses whitespace, and caps the
/// length.
#[must_use]
pub fn clean_for_title(s: &str, max_chars: usize) -> String {
    let stripped: String = s.chars().filter(|c| !matches!(c, '"' | '*' | '`')).collect();
    preview(&stripped, max_chars)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
