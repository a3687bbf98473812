//! # recall-template
//!
//! Template rendering for Recall prompts and injection blocks.
//!
//! The language is deliberately tiny: `{{name}}` macros and single-level
//! `{{#if name}}...{{/if}}` conditional blocks. Nesting is not supported,
//! and that is a parser constraint rather than an accident: an `{{#if` inside an open
//! block is plain text, and a block always ends at the first `{{/if}}`.
//!
//! Rendering is two passes, in a fixed order:
//!
//! 1. **Conditionals** — each block collapses to its inner content when the
//!    named binding is present and non-blank, otherwise to nothing. Inner
//!    content is left unprocessed.
//! 2. **Substitution** — each remaining `{{name}}` token becomes the bound
//!    value, or the empty string when unbound. Unknown macros never error.
//!
//! A companion [`segment`] operation splits a template at token boundaries
//! so literal runs can be wrapped as discrete chat turns.

#![deny(unsafe_code)]

mod render;
mod segment;
mod token;

pub use render::{Bindings, render, substitute_conditionals, substitute_macros};
pub use segment::{Segment, segment};
pub use token::{Token, TokenKind, tokenize};
