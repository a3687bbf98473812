//! Auto-summarize candidate collection.
//!
//! On qualifying chat events the engine asks for a candidate set: the
//! eligible, not-yet-summarized messages beyond a configurable lag, capped
//! by a depth limit. If the set is smaller than the configured batch size
//! the whole batch is discarded (nothing is summarized) rather than
//! summarizing a partial batch.

use recall_core::Chat;
use recall_memory::{EligibilityContext, is_eligible};
use tracing::{debug, trace};

/// Collect the auto-summarize candidate set, in chronological order.
///
/// Scans newest-first counting only eligible messages: the first `lag`
/// eligible messages are skipped (a delay in message-count), the scan stops
/// once `depth_limit` eligible-beyond-lag messages have been seen (0 means
/// unlimited), and messages that already have a summary are passed over.
#[must_use]
pub fn collect_auto_candidates(chat: &Chat, ctx: &EligibilityContext<'_>) -> Vec<usize> {
    let summarization = &ctx.settings.summarization;
    let lag = summarization.summarization_lag;
    let depth_limit = summarization.auto_summarize_message_limit;

    let mut candidates = Vec::new();
    let mut depth = 0usize;

    for i in (0..chat.len()).rev() {
        let Some(message) = chat.get(i) else { continue };
        if !is_eligible(message, ctx) {
            trace!(index = i, "skipped: ineligible");
            continue;
        }

        depth += 1;
        if depth <= lag {
            trace!(index = i, depth, lag, "skipped: within lag");
            continue;
        }
        if depth_limit > 0 && depth > depth_limit + lag {
            trace!(index = i, depth, "stopping: depth limit reached");
            break;
        }
        if message.record().has_memory() {
            trace!(index = i, "skipped: already summarized");
            continue;
        }
        candidates.push(i);
    }

    candidates.reverse();
    debug!(count = candidates.len(), "auto-summarize candidates collected");
    candidates
}

/// The candidate set, or nothing when it is below the minimum batch size.
#[must_use]
pub fn auto_summarize_batch(chat: &Chat, ctx: &EligibilityContext<'_>) -> Vec<usize> {
    let candidates = collect_auto_candidates(chat, ctx);
    let batch_size = ctx.settings.summarization.auto_summarize_batch_size;
    if candidates.len() < batch_size {
        debug!(
            candidates = candidates.len(),
            batch_size, "not enough candidates for a batch, discarding"
        );
        return Vec::new();
    }
    candidates
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::{ChatMessage, TokenCounter};
    use recall_settings::ProfileSettings;

    struct WordCounter;
    impl TokenCounter for WordCounter {
        fn count_tokens(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
        fn max_context_window(&self) -> usize {
            1000
        }
    }

    fn settings() -> ProfileSettings {
        let mut settings = ProfileSettings::default();
        settings.inclusion.message_length_threshold = 1;
        settings
    }

    fn eligible() -> ChatMessage {
        ChatMessage::character("Kira", "k", "a message with several words")
    }

    fn summarized() -> ChatMessage {
        let mut message = eligible();
        message.record_mut().record_success("s", "h", None, None);
        message
    }

    fn collect(chat: &Chat, settings: &ProfileSettings) -> Vec<usize> {
        let counter = WordCounter;
        let ctx = EligibilityContext {
            settings,
            disabled_characters: None,
            counter: &counter,
        };
        collect_auto_candidates(chat, &ctx)
    }

    fn batch(chat: &Chat, settings: &ProfileSettings) -> Vec<usize> {
        let counter = WordCounter;
        let ctx = EligibilityContext {
            settings,
            disabled_characters: None,
            counter: &counter,
        };
        auto_summarize_batch(chat, &ctx)
    }

    // -- collect_auto_candidates --

    #[test]
    fn collects_unsummarized_in_chronological_order() {
        let settings = settings();
        let chat = Chat::from_messages(vec![eligible(), eligible(), eligible()]);
        assert_eq!(collect(&chat, &settings), vec![0, 1, 2]);
    }

    #[test]
    fn skips_already_summarized() {
        let settings = settings();
        let chat = Chat::from_messages(vec![summarized(), eligible(), summarized()]);
        assert_eq!(collect(&chat, &settings), vec![1]);
    }

    #[test]
    fn lag_skips_newest_eligible() {
        let mut settings = settings();
        settings.summarization.summarization_lag = 2;
        let chat = Chat::from_messages(vec![eligible(), eligible(), eligible(), eligible()]);
        // The two newest eligible messages wait out the lag.
        assert_eq!(collect(&chat, &settings), vec![0, 1]);
    }

    #[test]
    fn lag_counts_eligible_only() {
        let mut settings = settings();
        settings.summarization.summarization_lag = 1;
        // Newest is a user message (ineligible by default) and must not
        // consume the lag.
        let chat = Chat::from_messages(vec![
            eligible(),
            eligible(),
            ChatMessage::user("Me", "user words here"),
        ]);
        assert_eq!(collect(&chat, &settings), vec![0]);
    }

    #[test]
    fn depth_limit_stops_the_scan() {
        let mut settings = settings();
        settings.summarization.auto_summarize_message_limit = 2;
        let chat = Chat::from_messages(vec![eligible(), eligible(), eligible(), eligible()]);
        // Only the two newest eligible messages are inside the window.
        assert_eq!(collect(&chat, &settings), vec![2, 3]);
    }

    #[test]
    fn depth_limit_zero_is_unlimited() {
        let mut settings = settings();
        settings.summarization.auto_summarize_message_limit = 0;
        let chat = Chat::from_messages((0..20).map(|_| eligible()).collect());
        assert_eq!(collect(&chat, &settings).len(), 20);
    }

    #[test]
    fn depth_limit_applies_beyond_lag() {
        let mut settings = settings();
        settings.summarization.summarization_lag = 1;
        settings.summarization.auto_summarize_message_limit = 2;
        let chat = Chat::from_messages(vec![eligible(), eligible(), eligible(), eligible()]);
        // Newest waits out the lag; the next two are in the window.
        assert_eq!(collect(&chat, &settings), vec![1, 2]);
    }

    #[test]
    fn empty_chat_collects_nothing() {
        let settings = settings();
        assert!(collect(&Chat::new(), &settings).is_empty());
    }

    // -- auto_summarize_batch --

    #[test]
    fn batch_below_minimum_is_discarded() {
        let mut settings = settings();
        settings.summarization.auto_summarize_batch_size = 3;
        let chat = Chat::from_messages(vec![eligible(), eligible()]);
        assert!(batch(&chat, &settings).is_empty());
    }

    #[test]
    fn batch_at_minimum_runs() {
        let mut settings = settings();
        settings.summarization.auto_summarize_batch_size = 2;
        let chat = Chat::from_messages(vec![eligible(), eligible()]);
        assert_eq!(batch(&chat, &settings), vec![0, 1]);
    }
}
