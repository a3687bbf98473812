//! Explicit scanner for the `{{...}}` token language.
//!
//! The scanner walks the input once, producing literal runs and brace tokens.
//! Every token keeps its raw source slice so later passes can re-emit
//! unprocessed text exactly as written.

/// What a scanned token means.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Plain text between tokens.
    Literal,
    /// A `{{name}}` macro. Carries the trimmed name.
    Macro(String),
    /// A `{{#if name}}` opener. Carries the trimmed name.
    IfOpen(String),
    /// A `{{/if}}` closer.
    IfClose,
}

/// One scanned token with its raw source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// Token classification.
    pub kind: TokenKind,
    /// Exact source slice this token was scanned from.
    pub raw: String,
}

impl Token {
    fn literal(raw: &str) -> Self {
        Self {
            kind: TokenKind::Literal,
            raw: raw.to_owned(),
        }
    }
}

/// Scan a template into tokens.
///
/// A `{{` with no closing `}}` is not a token: the remainder of the input
/// becomes one literal. The inner text of a brace pair is classified as
/// `{{#if name}}`, `{{/if}}`, or a plain macro; names are trimmed.
#[must_use]
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = input;

    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            // Unterminated brace: everything left is literal.
            break;
        };

        if open > 0 {
            tokens.push(Token::literal(&rest[..open]));
        }

        let inner = &after_open[..close];
        let raw = &rest[open..open + 2 + close + 2];
        let kind = classify(inner);
        tokens.push(Token {
            kind,
            raw: raw.to_owned(),
        });

        rest = &after_open[close + 2..];
    }

    if !rest.is_empty() {
        tokens.push(Token::literal(rest));
    }
    tokens
}

fn classify(inner: &str) -> TokenKind {
    let trimmed = inner.trim();
    if trimmed == "/if" {
        TokenKind::IfClose
    } else if let Some(name) = trimmed.strip_prefix("#if") {
        TokenKind::IfOpen(name.trim().to_owned())
    } else {
        TokenKind::Macro(trimmed.to_owned())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
