//! The inclusion window allocator.
//!
//! A single backward pass over the chat fills the short-term token budget
//! with the newest summaries, then the long-term budget with older
//! "remember"-flagged ones, tagging every message's record with its
//! resulting tier. `include` is derived state: this is the only code that
//! writes it.
//!
//! ## Algorithm
//!
//! Walking newest to oldest with a running concatenated-summary buffer:
//!
//! - Ineligible messages are tagged `None` and never touch the buffer.
//! - **Short-term phase** (until its budget first overflows): unsummarized
//!   messages are tagged `None`; otherwise the summary is tentatively
//!   appended and the buffer re-measured. Overflow latches the phase shut,
//!   records the boundary, resets the buffer, and retries the same message
//!   against long-term. Within budget, the message is tagged `Short`.
//! - **Long-term phase**: only `remember`-flagged messages are candidates,
//!   measured against a separately reset buffer. Overflow latches the phase;
//!   within budget tags `Long`.
//! - Anything reaching neither branch is tagged `None`.
//!
//! The buffers measure *cumulative* length, so one oversized summary can
//! saturate a tier immediately. Once both latches are set nothing further
//! can be included, so the remaining records are tagged `None` without any
//! more token counting. The early exit cannot change the output set.

use recall_core::{Chat, MemoryTier, TokenCounter};
use tracing::{debug, trace};

use crate::budget::TokenBudget;
use crate::classifier::{EligibilityContext, is_eligible};

/// Outcome of a recompute, for logging and diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocationSummary {
    /// Messages tagged short-term.
    pub short_count: usize,
    /// Messages tagged long-term.
    pub long_count: usize,
    /// Index of the message that overflowed short-term, if any.
    pub boundary_index: Option<usize>,
}

/// Recomputes tier membership for a whole chat.
pub struct InclusionAllocator<'a> {
    ctx: EligibilityContext<'a>,
    short_budget: TokenBudget,
    long_budget: TokenBudget,
}

impl<'a> InclusionAllocator<'a> {
    /// Create an allocator reading budgets from the context's settings.
    #[must_use]
    pub fn new(ctx: EligibilityContext<'a>) -> Self {
        let injection = &ctx.settings.injection;
        Self {
            ctx,
            short_budget: TokenBudget::from_tier(&injection.short_term),
            long_budget: TokenBudget::from_tier(&injection.long_term),
        }
    }

    /// Walk the chat newest-to-oldest and retag every record's `include`.
    ///
    /// Must run after any chat mutation, before the injection text is
    /// rendered.
    pub fn recompute(&self, chat: &mut Chat) -> AllocationSummary {
        let short_limit = self.short_budget.resolve(self.ctx.counter);
        let long_limit = self.long_budget.resolve(self.ctx.counter);
        let show_prefill = self.ctx.settings.summarization.show_prefill;
        let separator = self.ctx.settings.injection.separator.clone();

        let mut summary = AllocationSummary::default();
        let mut short_latched = false;
        let mut long_latched = false;
        let mut buffer = String::new();

        debug!(short_limit, long_limit, messages = chat.len(), "recomputing inclusion flags");

        for i in (0..chat.len()).rev() {
            if short_latched && long_latched {
                // Neither tier can accept anything further; finish tagging.
                for j in (0..=i).rev() {
                    if let Some(message) = chat.get_mut(j) {
                        message.record_mut().set_include(None);
                    }
                }
                break;
            }

            let Some(message) = chat.get(i) else { continue };
            if !is_eligible(message, &self.ctx) {
                trace!(index = i, "ineligible");
                self.tag(chat, i, None);
                continue;
            }

            let memory = message.record().memory_text(show_prefill);

            if !short_latched {
                let Some(memory_text) = memory.as_deref() else {
                    // Unsummarized messages cannot occupy short-term slots.
                    self.tag(chat, i, None);
                    continue;
                };
                let tentative = format!("{buffer}{separator}{memory_text}");
                if self.ctx.counter.count_tokens(&tentative) > short_limit {
                    short_latched = true;
                    summary.boundary_index = Some(i);
                    buffer.clear();
                    trace!(index = i, "short-term budget exhausted");
                    // This message becomes the first long-term candidate.
                } else {
                    self.tag(chat, i, Some(MemoryTier::Short));
                    summary.short_count += 1;
                    buffer = tentative;
                    continue;
                }
            }

            if !long_latched && message.record().remember() {
                let tentative = match memory.as_deref() {
                    Some(memory_text) => format!("{buffer}{separator}{memory_text}"),
                    None => buffer.clone(),
                };
                if self.ctx.counter.count_tokens(&tentative) > long_limit {
                    long_latched = true;
                    trace!(index = i, "long-term budget exhausted");
                } else {
                    self.tag(chat, i, Some(MemoryTier::Long));
                    summary.long_count += 1;
                    buffer = tentative;
                    continue;
                }
            }

            self.tag(chat, i, None);
        }

        debug!(
            short = summary.short_count,
            long = summary.long_count,
            boundary = ?summary.boundary_index,
            "inclusion flags recomputed"
        );
        summary
    }

    fn tag(&self, chat: &mut Chat, index: usize, tier: Option<MemoryTier>) {
        if let Some(message) = chat.get_mut(index) {
            message.record_mut().set_include(tier);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
