//! Profile settings types.
//!
//! A [`ProfileSettings`] bundle holds every tunable the engine reads,
//! grouped by concern. All structs deserialize with `#[serde(default)]` so
//! profiles saved by older versions pick up new fields at their defaults.

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_LONG_TEMPLATE, DEFAULT_PROMPT, DEFAULT_SHORT_TEMPLATE, MESSAGE_MACRO};

// ─────────────────────────────────────────────────────────────────────────────
// Enums
// ─────────────────────────────────────────────────────────────────────────────

/// How a tier's context limit number is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContextLimitUnit {
    /// Percentage of the model's current context window.
    #[default]
    Percent,
    /// Absolute token count.
    Tokens,
}

/// What prior-message history goes into a summary prompt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HistoryMode {
    /// No history at all.
    #[default]
    None,
    /// Prior messages' summaries only.
    SummariesOnly,
    /// Prior raw messages only.
    MessagesOnly,
    /// Both, interleaved in message order.
    MessagesAndSummaries,
}

/// Where an injection slot mounts in the host's prompt assembly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InjectionPosition {
    /// Inside the main prompt at the configured depth.
    #[default]
    InPrompt,
    /// Before the fixed anchor point.
    BeforePrompt,
    /// After the fixed anchor point.
    AfterPrompt,
}

/// Role the injected block is attributed to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InjectionRole {
    /// System role.
    #[default]
    System,
    /// User role.
    User,
    /// Assistant role.
    Assistant,
}

// ─────────────────────────────────────────────────────────────────────────────
// Setting groups
// ─────────────────────────────────────────────────────────────────────────────

/// Which messages are candidates for summarization at all.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InclusionSettings {
    /// Minimum raw-message token length to be summarized.
    pub message_length_threshold: usize,
    /// Summarize user-authored messages.
    pub include_user_messages: bool,
    /// Summarize hidden/system messages.
    pub include_system_messages: bool,
    /// Summarize narrator messages.
    pub include_narrator_messages: bool,
}

impl Default for InclusionSettings {
    fn default() -> Self {
        Self {
            message_length_threshold: 10,
            include_user_messages: false,
            include_system_messages: false,
            include_narrator_messages: false,
        }
    }
}

/// Summarization prompt and pipeline behavior.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SummarizationSettings {
    /// Summary prompt template.
    pub prompt: String,
    /// Prefill appended to the prompt and assumed to precede model output.
    pub prefill: String,
    /// Show the prefill when memories are displayed and injected.
    pub show_prefill: bool,
    /// Completion preset used while summarizing. Empty keeps the current one.
    pub completion_preset: String,
    /// Connection profile used while summarizing. Empty keeps the current one.
    pub connection_profile: String,
    /// Summarize new chat messages automatically.
    pub auto_summarize: bool,
    /// Eligible messages to skip before auto-summarization kicks in.
    pub summarization_lag: usize,
    /// Seconds to wait between consecutive summarizations.
    pub time_delay_seconds: u64,
    /// Minimum number of candidates before an auto batch runs.
    pub auto_summarize_batch_size: usize,
    /// Maximum eligible messages beyond the lag to consider (0 = unlimited).
    pub auto_summarize_message_limit: usize,
    /// Re-summarize edited messages automatically.
    pub auto_summarize_on_edit: bool,
    /// Re-summarize regenerated swipes automatically.
    pub auto_summarize_on_swipe: bool,
    /// Report batch progress.
    pub auto_summarize_progress: bool,
    /// Run auto-summarization right before a new message is sent.
    pub auto_summarize_on_send: bool,
    /// Ask the host to add scan-source (world info) text when generating.
    pub include_world_info: bool,
    /// Block chat input while a batch is summarizing.
    pub block_chat: bool,
    /// Render the whole prompt as one block instead of per-segment turns.
    pub nest_messages_in_prompt: bool,
}

impl Default for SummarizationSettings {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_owned(),
            prefill: String::new(),
            show_prefill: false,
            completion_preset: String::new(),
            connection_profile: String::new(),
            auto_summarize: true,
            summarization_lag: 0,
            time_delay_seconds: 0,
            auto_summarize_batch_size: 1,
            auto_summarize_message_limit: 10,
            auto_summarize_on_edit: true,
            auto_summarize_on_swipe: true,
            auto_summarize_progress: true,
            auto_summarize_on_send: false,
            include_world_info: false,
            block_chat: true,
            nest_messages_in_prompt: false,
        }
    }
}

/// Prior-message history included in summary prompts.
///
/// These sender filters are independent of the main eligibility classifier:
/// a message that would never be summarized can still appear as context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistorySettings {
    /// Number of prior messages to include.
    pub message_count: usize,
    /// What to include for each prior message.
    pub mode: HistoryMode,
    /// Include prior user messages.
    pub include_user_messages: bool,
    /// Include prior hidden/system messages.
    pub include_system_messages: bool,
    /// Include prior thought messages.
    pub include_thought_messages: bool,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            message_count: 3,
            mode: HistoryMode::None,
            include_user_messages: false,
            include_system_messages: false,
            include_thought_messages: false,
        }
    }
}

/// Configuration of one memory tier's injection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TierSettings {
    /// Injection template for this tier.
    pub template: String,
    /// Context limit number.
    pub context_limit: usize,
    /// Unit of `context_limit`.
    pub context_limit_unit: ContextLimitUnit,
    /// Where the block mounts.
    pub position: InjectionPosition,
    /// Role the block is attributed to.
    pub role: InjectionRole,
    /// Nesting depth for in-prompt placement.
    pub depth: usize,
    /// Whether the block participates in the host's world-info scan.
    pub scan: bool,
}

impl TierSettings {
    fn with_template(template: &str) -> Self {
        Self {
            template: template.to_owned(),
            context_limit: 10,
            context_limit_unit: ContextLimitUnit::Percent,
            position: InjectionPosition::InPrompt,
            role: InjectionRole::System,
            depth: 2,
            scan: false,
        }
    }
}

impl Default for TierSettings {
    fn default() -> Self {
        Self::with_template("")
    }
}

/// Both tiers' injection configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InjectionSettings {
    /// Short-term tier.
    pub short_term: TierSettings,
    /// Long-term tier.
    pub long_term: TierSettings,
    /// Separator placed before each concatenated summary.
    pub separator: String,
}

impl Default for InjectionSettings {
    fn default() -> Self {
        Self {
            short_term: TierSettings::with_template(DEFAULT_SHORT_TEMPLATE),
            long_term: TierSettings::with_template(DEFAULT_LONG_TEMPLATE),
            separator: "\n* ".to_owned(),
        }
    }
}

/// Settings that don't belong to any other group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MiscSettings {
    /// Display memories under each chat message.
    pub display_memories: bool,
    /// Whether memory starts enabled for chats with no explicit state.
    pub default_chat_enabled: bool,
    /// Use the global on/off state instead of per-chat state.
    pub use_global_toggle_state: bool,
    /// Cap on raw messages the host keeps in context (-1 = no limit).
    pub limit_injected_messages: i64,
}

impl Default for MiscSettings {
    fn default() -> Self {
        Self {
            display_memories: true,
            default_chat_enabled: true,
            use_global_toggle_state: false,
            limit_injected_messages: -1,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ProfileSettings
// ─────────────────────────────────────────────────────────────────────────────

/// One named profile's complete configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileSettings {
    /// Eligibility criteria.
    pub inclusion: InclusionSettings,
    /// Summarization pipeline behavior.
    pub summarization: SummarizationSettings,
    /// Prompt history construction.
    pub history: HistorySettings,
    /// Injection templates and budgets.
    pub injection: InjectionSettings,
    /// Everything else.
    pub misc: MiscSettings,
}

/// A repair applied by [`ProfileSettings::sanitize`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingsRepair {
    /// The mandatory `{{message}}` macro was appended to the prompt.
    MessageMacroAppended,
    /// The auto-summarize depth limit was raised to the batch size.
    MessageLimitRaised {
        /// The new limit (equal to the batch size).
        to: usize,
    },
}

impl ProfileSettings {
    /// Repair heuristically-detectable misconfiguration.
    ///
    /// User-edited templates sometimes lose the mandatory message macro, and
    /// a depth limit below the batch size would make auto-summarization
    /// permanently discard its batches. Both are fixed in place; the
    /// returned list says what changed so the caller can notify.
    pub fn sanitize(&mut self) -> Vec<SettingsRepair> {
        let mut repairs = Vec::new();

        let macro_token = format!("{{{{{MESSAGE_MACRO}}}}}");
        if !self.summarization.prompt.contains(&macro_token) {
            self.summarization.prompt.push('\n');
            self.summarization.prompt.push_str(&macro_token);
            repairs.push(SettingsRepair::MessageMacroAppended);
        }

        let batch = self.summarization.auto_summarize_batch_size;
        let limit = self.summarization.auto_summarize_message_limit;
        if limit != 0 && limit < batch {
            self.summarization.auto_summarize_message_limit = batch;
            repairs.push(SettingsRepair::MessageLimitRaised { to: batch });
        }

        repairs
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = ProfileSettings::default();
        assert_eq!(settings.inclusion.message_length_threshold, 10);
        assert!(!settings.inclusion.include_user_messages);
        assert!(settings.summarization.auto_summarize);
        assert_eq!(settings.summarization.auto_summarize_batch_size, 1);
        assert_eq!(settings.summarization.auto_summarize_message_limit, 10);
        assert_eq!(settings.history.message_count, 3);
        assert_eq!(settings.history.mode, HistoryMode::None);
        assert_eq!(settings.injection.separator, "\n* ");
        assert_eq!(settings.injection.short_term.context_limit, 10);
        assert_eq!(
            settings.injection.short_term.context_limit_unit,
            ContextLimitUnit::Percent
        );
        assert_eq!(settings.misc.limit_injected_messages, -1);
    }

    #[test]
    fn serde_roundtrip() {
        let settings = ProfileSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: ProfileSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, back);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{"inclusion": {"includeUserMessages": true}}"#;
        let settings: ProfileSettings = serde_json::from_str(json).unwrap();
        assert!(settings.inclusion.include_user_messages);
        assert_eq!(settings.inclusion.message_length_threshold, 10);
        assert_eq!(settings.summarization.prompt, DEFAULT_PROMPT);
    }

    #[test]
    fn camel_case_wire_format() {
        let json = serde_json::to_value(ProfileSettings::default()).unwrap();
        assert!(json["summarization"]["autoSummarizeBatchSize"].is_number());
        assert!(json["injection"]["shortTerm"]["contextLimitUnit"].is_string());
    }

    // -- sanitize --

    #[test]
    fn sanitize_appends_missing_message_macro() {
        let mut settings = ProfileSettings::default();
        settings.summarization.prompt = "Summarize.".into();
        let repairs = settings.sanitize();
        assert_eq!(repairs, vec![SettingsRepair::MessageMacroAppended]);
        assert!(settings.summarization.prompt.ends_with("\n{{message}}"));
    }

    #[test]
    fn sanitize_keeps_valid_prompt() {
        let mut settings = ProfileSettings::default();
        assert!(settings.sanitize().is_empty());
    }

    #[test]
    fn sanitize_raises_limit_to_batch_size() {
        let mut settings = ProfileSettings::default();
        settings.summarization.auto_summarize_batch_size = 5;
        settings.summarization.auto_summarize_message_limit = 3;
        let repairs = settings.sanitize();
        assert!(repairs.contains(&SettingsRepair::MessageLimitRaised { to: 5 }));
        assert_eq!(settings.summarization.auto_summarize_message_limit, 5);
    }

    #[test]
    fn sanitize_leaves_unlimited_limit_alone() {
        let mut settings = ProfileSettings::default();
        settings.summarization.auto_summarize_batch_size = 5;
        settings.summarization.auto_summarize_message_limit = 0;
        assert!(settings.sanitize().is_empty());
    }
}
