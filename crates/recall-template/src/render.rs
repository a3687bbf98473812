//! Two-pass template rendering.

use std::collections::BTreeMap;

use crate::token::{Token, TokenKind, tokenize};

/// Named string bindings for a render.
#[derive(Clone, Debug, Default)]
pub struct Bindings {
    values: BTreeMap<String, String>,
}

impl Bindings {
    /// Create an empty binding set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding, replacing any previous value for the name.
    #[must_use]
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.values.insert(name.into(), value.into());
        self
    }

    /// Look up a bound value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Whether the binding exists and is non-blank after trimming.
    ///
    /// This is the condition `{{#if name}}` blocks test.
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some_and(|value| !value.trim().is_empty())
    }
}

/// Resolve `{{#if name}}...{{/if}}` blocks, leaving everything else as-is.
///
/// A block's inner content is emitted unprocessed when the binding is set,
/// and dropped otherwise. Blocks match lazily left-to-right: a block ends at
/// the first `{{/if}}` after its opener. An opener with no closer is left
/// for the substitution pass, and a stray closer passes through untouched.
#[must_use]
pub fn substitute_conditionals(template: &str, bindings: &Bindings) -> String {
    let tokens = tokenize(template);
    let mut out = String::with_capacity(template.len());
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        match &token.kind {
            TokenKind::IfOpen(name) => {
                match find_close(&tokens, i + 1) {
                    Some(close) => {
                        if bindings.is_set(name) {
                            for inner in &tokens[i + 1..close] {
                                out.push_str(&inner.raw);
                            }
                        }
                        i = close + 1;
                    }
                    None => {
                        // Unterminated block: keep the opener as raw text.
                        out.push_str(&token.raw);
                        i += 1;
                    }
                }
            }
            _ => {
                out.push_str(&token.raw);
                i += 1;
            }
        }
    }
    out
}

fn find_close(tokens: &[Token], from: usize) -> Option<usize> {
    tokens[from..]
        .iter()
        .position(|t| t.kind == TokenKind::IfClose)
        .map(|offset| from + offset)
}

/// Replace every `{{name}}` token with its bound value.
///
/// Unknown macros become the empty string, never an error. Leftover
/// conditional markers (from malformed input) are swallowed the same way.
#[must_use]
pub fn substitute_macros(template: &str, bindings: &Bindings) -> String {
    let mut out = String::with_capacity(template.len());
    for token in tokenize(template) {
        match &token.kind {
            TokenKind::Literal => out.push_str(&token.raw),
            TokenKind::Macro(name) => out.push_str(bindings.get(name).unwrap_or("")),
            TokenKind::IfOpen(_) | TokenKind::IfClose => {}
        }
    }
    out
}

/// Full render: conditional pass, then substitution pass.
///
/// The order matters: a bound value may gate a block that textually
/// surrounds its own macro.
#[must_use]
pub fn render(template: &str, bindings: &Bindings) -> String {
    let resolved = substitute_conditionals(template, bindings);
    substitute_macros(&resolved, bindings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
