//! Splitting a template at token boundaries.
//!
//! Used when a prompt should appear as several discrete system turns rather
//! than one block: literal runs become text segments for the host to format,
//! macro tokens stay in place for a later substitution pass.

use crate::token::{TokenKind, tokenize};

/// One piece of a segmented template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// A trimmed run of literal text.
    Text(String),
    /// A raw `{{...}}` token, braces included.
    Token(String),
}

/// Split a template on `{{...}}` boundaries.
///
/// Literal runs are trimmed; empty runs are dropped. Conditional markers
/// should already be resolved; any that remain are passed through as
/// tokens.
#[must_use]
pub fn segment(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for token in tokenize(template) {
        match token.kind {
            TokenKind::Literal => {
                let trimmed = token.raw.trim();
                if !trimmed.is_empty() {
                    segments.push(Segment::Text(trimmed.to_owned()));
                }
            }
            TokenKind::Macro(_) | TokenKind::IfOpen(_) | TokenKind::IfClose => {
                segments.push(Segment::Token(token.raw));
            }
        }
    }
    segments
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
