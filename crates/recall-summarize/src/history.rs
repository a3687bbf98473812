//! Prior-message history for summary prompts.
//!
//! The history walks backward from the target message collecting context.
//! Its sender filters are independent of the main eligibility classifier
//! (a message that will never be *summarized* can still appear as context),
//! but whether a prior message's *summary* is included follows the regular
//! eligibility rules, so history matches the injection.

use recall_core::{Chat, Sender, TurnFormatter};
use recall_memory::{EligibilityContext, is_eligible};
use recall_settings::HistoryMode;

/// Build the `history` binding for the message at `index`.
///
/// Collects up to the configured number of prior messages that pass the
/// history sender filters, formats them per the configured mode, and joins
/// them in chronological order. Returns `None` when the count is zero or
/// the mode is [`HistoryMode::None`], in which case the prompt's conditional
/// block drops its history section entirely.
#[must_use]
pub fn build_history(
    chat: &Chat,
    index: usize,
    ctx: &EligibilityContext<'_>,
    formatter: &dyn TurnFormatter,
) -> Option<String> {
    let history = &ctx.settings.history;
    if history.message_count == 0 || history.mode == HistoryMode::None {
        return None;
    }
    let show_prefill = ctx.settings.summarization.show_prefill;

    let mut lines = Vec::new();
    let mut included_count = 0;

    for i in (0..index.min(chat.len())).rev() {
        if included_count >= history.message_count {
            break;
        }
        let Some(message) = chat.get(i) else { continue };

        let passes_filters = match message.sender {
            Sender::User if !history.include_user_messages => false,
            _ if message.hidden && !history.include_system_messages => false,
            _ if message.thought && !history.include_thought_messages => false,
            _ => true,
        };
        if !passes_filters {
            continue;
        }

        let mut included = false;

        if matches!(history.mode, HistoryMode::SummariesOnly | HistoryMode::MessagesAndSummaries) {
            // Summary inclusion follows the regular eligibility rules so
            // history matches what gets injected.
            if is_eligible(message, ctx) {
                if let Some(memory) = message.record().memory_text(show_prefill) {
                    lines.push(formatter.format_turn(
                        "assistant",
                        &format!("Summary: {memory}"),
                        false,
                        false,
                    ));
                    included = true;
                }
            }
        }
        if matches!(history.mode, HistoryMode::MessagesOnly | HistoryMode::MessagesAndSummaries) {
            lines.push(formatter.format_turn(
                &message.name,
                message.text(),
                message.sender == Sender::User,
                false,
            ));
            included = true;
        }

        if included {
            included_count += 1;
        }
    }

    lines.reverse();
    Some(lines.join("\n"))
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

    struct PlainFormatter;
    impl TurnFormatter for PlainFormatter {
        fn format_turn(&self, name: &str, text: &str, _is_user: bool, _note: bool) -> String {
            format!("{name}: {text}")
        }
        fn output_sequence(&self) -> String {
            "assistant:".into()
        }
    }

    fn settings(mode: HistoryMode, count: usize) -> ProfileSettings {
        let mut settings = ProfileSettings::default();
        settings.inclusion.message_length_threshold = 1;
        settings.history.mode = mode;
        settings.history.message_count = count;
        settings
    }

    fn summarized(text: &str, summary: &str) -> ChatMessage {
        let mut message = ChatMessage::character("Kira", "k", text);
        message.record_mut().record_success(summary, "h", None, None);
        message
    }

    fn history_for(chat: &Chat, index: usize, settings: &ProfileSettings) -> Option<String> {
        let counter = WordCounter;
        let ctx = EligibilityContext {
            settings,
            disabled_characters: None,
            counter: &counter,
        };
        build_history(chat, index, &ctx, &PlainFormatter)
    }

    #[test]
    fn none_mode_yields_no_history() {
        let chat = Chat::from_messages(vec![summarized("one two three", "s1")]);
        assert!(history_for(&chat, 1, &settings(HistoryMode::None, 3)).is_none());
    }

    #[test]
    fn zero_count_yields_no_history() {
        let chat = Chat::from_messages(vec![summarized("one two three", "s1")]);
        assert!(history_for(&chat, 1, &settings(HistoryMode::MessagesOnly, 0)).is_none());
    }

    #[test]
    fn messages_only_in_chronological_order() {
        let chat = Chat::from_messages(vec![
            summarized("first message text", "s1"),
            summarized("second message text", "s2"),
            summarized("target message text", "s3"),
        ]);
        let history = history_for(&chat, 2, &settings(HistoryMode::MessagesOnly, 5)).unwrap();
        assert_eq!(history, "Kira: first message text\nKira: second message text");
    }

    #[test]
    fn count_limits_to_most_recent_prior() {
        let chat = Chat::from_messages(vec![
            summarized("oldest", "s1"),
            summarized("middle", "s2"),
            summarized("newest prior", "s3"),
            summarized("target", "s4"),
        ]);
        let history = history_for(&chat, 3, &settings(HistoryMode::MessagesOnly, 2)).unwrap();
        assert_eq!(history, "Kira: middle\nKira: newest prior");
    }

    #[test]
    fn summaries_only_skips_unsummarized() {
        let chat = Chat::from_messages(vec![
            summarized("has a summary here", "the summary"),
            ChatMessage::character("Kira", "k", "no summary on this one"),
            summarized("target text words", "s"),
        ]);
        let history = history_for(&chat, 2, &settings(HistoryMode::SummariesOnly, 5)).unwrap();
        assert_eq!(history, "assistant: Summary: the summary");
    }

    #[test]
    fn summaries_respect_eligibility() {
        // An excluded message's summary never shows up as history context.
        let mut excluded = summarized("excluded message text", "hidden summary");
        excluded.record_mut().set_exclude(true);
        let chat = Chat::from_messages(vec![excluded, summarized("target", "s")]);

        let history = history_for(&chat, 1, &settings(HistoryMode::SummariesOnly, 5)).unwrap();
        assert_eq!(history, "");
    }

    #[test]
    fn combined_mode_interleaves_message_after_its_summary() {
        let chat = Chat::from_messages(vec![
            summarized("earlier words", "earlier summary"),
            summarized("target", "s"),
        ]);
        let history =
            history_for(&chat, 1, &settings(HistoryMode::MessagesAndSummaries, 5)).unwrap();
        assert_eq!(
            history,
            "Kira: earlier words\nassistant: Summary: earlier summary"
        );
    }

    #[test]
    fn user_messages_filtered_by_history_toggle() {
        let mut settings = settings(HistoryMode::MessagesOnly, 5);
        let chat = Chat::from_messages(vec![
            ChatMessage::user("Me", "user words here"),
            summarized("character words here", "s"),
            summarized("target", "s"),
        ]);

        let without = history_for(&chat, 2, &settings).unwrap();
        assert_eq!(without, "Kira: character words here");

        settings.history.include_user_messages = true;
        let with = history_for(&chat, 2, &settings).unwrap();
        assert_eq!(with, "Me: user words here\nKira: character words here");
    }

    #[test]
    fn index_past_end_walks_whole_chat() {
        let chat = Chat::from_messages(vec![summarized("only message", "s")]);
        let history = history_for(&chat, 10, &settings(HistoryMode::MessagesOnly, 5)).unwrap();
        assert_eq!(history, "Kira: only message");
    }
}
