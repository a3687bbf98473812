//! Rendering the two memory blocks into injectable prompt text.

use recall_core::{Chat, MemoryTier};
use recall_settings::{
    InjectionPosition, InjectionRole, LONG_MEMORY_MACRO, SHORT_MEMORY_MACRO, TierSettings,
};
use recall_template::{Bindings, render};
use tracing::trace;

use crate::classifier::{EligibilityContext, MessageFilter, collect_filtered};

/// A rendered injection block plus its mounting parameters.
///
/// The host mounts one of these per tier into its prompt assembly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionPrompt {
    /// Rendered block text; empty when the tier holds nothing.
    pub text: String,
    /// Where the block mounts.
    pub position: InjectionPosition,
    /// Nesting depth for in-prompt placement.
    pub depth: usize,
    /// Role the block is attributed to.
    pub role: InjectionRole,
    /// Whether the block participates in the host's world-info scan.
    pub scan: bool,
}

impl ExtensionPrompt {
    /// Build a prompt slot from tier settings and rendered text.
    #[must_use]
    pub fn new(tier: &TierSettings, text: String) -> Self {
        Self {
            text,
            position: tier.position,
            depth: tier.depth,
            role: tier.role,
            scan: tier.scan,
        }
    }

    /// An empty slot that clears the tier's injection.
    #[must_use]
    pub fn cleared(tier: &TierSettings) -> Self {
        Self::new(tier, String::new())
    }
}

/// Concatenate the summaries of the given message indexes.
///
/// The configured separator precedes every summary, including the first;
/// messages without a summary contribute nothing.
#[must_use]
pub fn concatenate_memories(
    chat: &Chat,
    indexes: &[usize],
    separator: &str,
    show_prefill: bool,
) -> String {
    let mut text = String::new();
    for &index in indexes {
        let Some(message) = chat.get(index) else { continue };
        if let Some(memory) = message.record().memory_text(show_prefill) {
            text.push_str(separator);
            text.push_str(&memory);
        }
    }
    text
}

/// Render one tier's injection text from the current inclusion flags.
///
/// Collects the tier's members in chronological order, concatenates their
/// summaries, and substitutes the result into the tier's template. A tier
/// with no members renders with a blank macro, which collapses the default
/// templates to nothing.
#[must_use]
pub fn tier_injection_text(chat: &Chat, ctx: &EligibilityContext<'_>, tier: MemoryTier) -> String {
    let (filter, tier_settings, macro_name) = match tier {
        MemoryTier::Short => (
            MessageFilter::short_tier(),
            &ctx.settings.injection.short_term,
            SHORT_MEMORY_MACRO,
        ),
        MemoryTier::Long => (
            MessageFilter::long_tier(),
            &ctx.settings.injection.long_term,
            LONG_MEMORY_MACRO,
        ),
    };

    let indexes = collect_filtered(chat, ctx, &filter, None);
    let text = concatenate_memories(
        chat,
        &indexes,
        &ctx.settings.injection.separator,
        ctx.settings.summarization.show_prefill,
    );
    trace!(?tier, members = indexes.len(), chars = text.len(), "rendering tier injection");

    render(&tier_settings.template, &Bindings::new().bind(macro_name, text))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
