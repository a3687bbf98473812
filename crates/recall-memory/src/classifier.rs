//! Message eligibility and bulk-selection filtering.
//!
//! Eligibility is a pure function of one message and the current settings,
//! with no token-budget awareness. The rules short-circuit in a fixed order, and
//! a user "remember" flag beats everything except the engine's own notices.

use std::collections::BTreeSet;

use recall_core::{ChatMessage, Chat, MemoryTier, Sender, TokenCounter};
use recall_settings::ProfileSettings;

/// Everything eligibility decisions read besides the message itself.
#[derive(Clone, Copy)]
pub struct EligibilityContext<'a> {
    /// Active profile settings.
    pub settings: &'a ProfileSettings,
    /// Characters disabled for summarization in this chat, if it is a group.
    pub disabled_characters: Option<&'a BTreeSet<String>>,
    /// Host token accounting.
    pub counter: &'a dyn TokenCounter,
}

/// Whether a message is a candidate for summarization and injection at all.
///
/// Evaluated in order, short-circuiting on the first match:
///
/// 1. engine-injected notices are never summarized
/// 2. `remember` makes a message eligible unconditionally
/// 3. `exclude` makes it ineligible unconditionally
/// 4. user messages obey the include-user-messages setting
/// 5. thought asides are always ineligible
/// 6. hidden messages obey the include-system-messages setting
/// 7. narrator messages obey the include-narrator-messages setting
/// 8. the sender's per-character toggle (group chats)
/// 9. the raw text must reach the minimum token length
#[must_use]
pub fn is_eligible(message: &ChatMessage, ctx: &EligibilityContext<'_>) -> bool {
    if message.engine_notice {
        return false;
    }
    let record = message.record();
    if record.remember() {
        return true;
    }
    if record.exclude() {
        return false;
    }

    let inclusion = &ctx.settings.inclusion;
    if message.sender == Sender::User && !inclusion.include_user_messages {
        return false;
    }
    if message.thought {
        return false;
    }
    if message.hidden && !inclusion.include_system_messages {
        return false;
    }
    if message.sender == Sender::Narrator && !inclusion.include_narrator_messages {
        return false;
    }
    if ctx
        .disabled_characters
        .is_some_and(|disabled| disabled.contains(&message.character_key))
    {
        return false;
    }
    if ctx.counter.count_tokens(message.text()) < inclusion.message_length_threshold {
        return false;
    }
    true
}

/// Optional AND-gates composed on top of [`is_eligible`] for bulk selection.
///
/// Each `allow_*` that is false removes the matching class of messages.
/// The default allows everything eligibility allows.
#[derive(Clone, Copy, Debug)]
pub struct MessageFilter {
    /// Keep messages that have no summary yet.
    pub allow_no_summary: bool,
    /// Keep messages currently in short-term memory.
    pub allow_short: bool,
    /// Keep messages currently in long-term memory.
    pub allow_long: bool,
    /// Keep messages flagged "remember".
    pub allow_remember: bool,
    /// Keep messages with manually edited summaries.
    pub allow_edited: bool,
    /// Keep summarized messages that ended up in neither tier.
    pub allow_unincluded: bool,
}

impl Default for MessageFilter {
    fn default() -> Self {
        Self {
            allow_no_summary: true,
            allow_short: true,
            allow_long: true,
            allow_remember: true,
            allow_edited: true,
            allow_unincluded: true,
        }
    }
}

impl MessageFilter {
    /// Summarized messages sitting in short-term memory.
    #[must_use]
    pub fn short_tier() -> Self {
        Self {
            allow_no_summary: false,
            allow_long: false,
            allow_unincluded: false,
            ..Self::default()
        }
    }

    /// Summarized messages sitting in long-term memory.
    #[must_use]
    pub fn long_tier() -> Self {
        Self {
            allow_no_summary: false,
            allow_short: false,
            allow_unincluded: false,
            ..Self::default()
        }
    }
}

/// Whether a message passes eligibility plus the filter's gates.
#[must_use]
pub fn matches_filter(
    message: &ChatMessage,
    ctx: &EligibilityContext<'_>,
    filter: &MessageFilter,
) -> bool {
    if !is_eligible(message, ctx) {
        return false;
    }
    let record = message.record();
    let has_memory = record.has_memory();

    if !filter.allow_no_summary && !has_memory {
        return false;
    }
    if !filter.allow_short && record.include() == Some(MemoryTier::Short) && has_memory {
        return false;
    }
    if !filter.allow_long && record.include() == Some(MemoryTier::Long) && has_memory {
        return false;
    }
    if !filter.allow_edited && record.edited() && has_memory {
        return false;
    }
    if !filter.allow_remember && record.remember() && has_memory {
        return false;
    }
    if !filter.allow_unincluded && record.include().is_none() && has_memory {
        return false;
    }
    true
}

/// Indexes of messages matching a filter, in chronological order.
///
/// The chat is scanned newest-first so an optional `limit` keeps the most
/// recent matches; the result is reversed before returning.
#[must_use]
pub fn collect_filtered(
    chat: &Chat,
    ctx: &EligibilityContext<'_>,
    filter: &MessageFilter,
    limit: Option<usize>,
) -> Vec<usize> {
    let mut indexes = Vec::new();
    for i in (0..chat.len()).rev() {
        let Some(message) = chat.get(i) else { continue };
        if matches_filter(message, ctx, filter) {
            indexes.push(i);
        }
        if limit.is_some_and(|cap| cap > 0 && indexes.len() >= cap) {
            break;
        }
    }
    indexes.reverse();
    indexes
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
