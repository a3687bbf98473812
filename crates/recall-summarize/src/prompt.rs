//! Building the full summary prompt for one message.
//!
//! Assembly order matters and mirrors the injection engine's two-pass
//! template rules:
//!
//! 1. Resolve `{{#if ...}}` blocks against the `message`/`history` bindings
//!    (a dropped history section must take its surrounding text with it).
//! 2. Either nest the whole prompt as a single system turn, or split it at
//!    token boundaries and format each literal run as its own system turn.
//! 3. Substitute the remaining macros (`message`, `history`, `words`).
//! 4. Append the instruct template's output-priming sequence and the
//!    configured prefill.

use recall_core::{Chat, Sender, TurnFormatter};
use recall_memory::EligibilityContext;
use recall_settings::{HISTORY_MACRO, MESSAGE_MACRO, WORDS_MACRO};
use recall_template::{Bindings, Segment, segment, substitute_conditionals, substitute_macros};
use tracing::trace;

use crate::history::build_history;

/// Word-target fallback when the summary preset reports no max token count.
pub const DEFAULT_WORD_TARGET: usize = 200;

/// Build the complete summarization prompt for the message at `index`.
///
/// `word_target` is the value bound to `{{words}}`, normally derived from
/// the summary preset's max-token setting. Returns `None` when the index is
/// out of range.
#[must_use]
pub fn build_prompt(
    chat: &Chat,
    index: usize,
    ctx: &EligibilityContext<'_>,
    formatter: &dyn TurnFormatter,
    word_target: usize,
) -> Option<String> {
    let message = chat.get(index)?;
    let summarization = &ctx.settings.summarization;

    let message_text = formatter.format_turn(
        &message.name,
        message.text(),
        message.sender == Sender::User,
        false,
    );
    let history_text = build_history(chat, index, ctx, formatter);

    let mut bindings = Bindings::new()
        .bind(MESSAGE_MACRO, message_text)
        .bind(WORDS_MACRO, word_target.to_string());
    if let Some(history) = history_text {
        bindings = bindings.bind(HISTORY_MACRO, history);
    }

    // Conditionals first: a dropped block removes plain text that would
    // otherwise leak into the per-segment system turns below.
    let resolved = substitute_conditionals(&summarization.prompt, &bindings);

    let body = if summarization.nest_messages_in_prompt {
        let substituted = substitute_macros(&resolved, &bindings);
        formatter.format_turn("", &substituted, false, true)
    } else {
        let mut parts = String::new();
        for piece in segment(&resolved) {
            match piece {
                Segment::Text(text) => {
                    parts.push_str(&formatter.format_turn("", &text, false, true));
                }
                Segment::Token(raw) => parts.push_str(&raw),
            }
        }
        substitute_macros(&parts, &bindings)
    };

    let mut prompt = format!("{body}\n{}", formatter.output_sequence());
    if !summarization.prefill.is_empty() {
        prompt.push(' ');
        prompt.push_str(&summarization.prefill);
    }

    trace!(index, chars = prompt.len(), "summary prompt built");
    Some(prompt)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
