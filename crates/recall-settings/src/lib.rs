//! # recall-settings
//!
//! Configuration for the Recall memory engine.
//!
//! Settings live in named **profiles**: bundles of every tunable the engine
//! reads. Exactly one profile is active per chat, resolved by a priority
//! chain: chat-level override > character-level override > currently
//! selected profile > the hardwired `Default`.
//!
//! The [`SettingsStore`] owns the profiles plus the global state that sits
//! outside any profile (per-chat enablement, profile bindings, disabled
//! group characters). It persists as one JSON document, deep-merged over
//! compiled defaults on load so older files pick up new fields.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod store;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_store_from_path, save_store_to_path};
pub use store::SettingsStore;
pub use types::*;

/// Name of the macro bound to the formatted message text in summary prompts.
pub const MESSAGE_MACRO: &str = "message";
/// Name of the macro bound to prior-message history in summary prompts.
pub const HISTORY_MACRO: &str = "history";
/// Name of the macro bound to the target word count in summary prompts.
pub const WORDS_MACRO: &str = "words";
/// Name of the macro bound to the short-term memory text in its template.
pub const SHORT_MEMORY_MACRO: &str = "short_memory";
/// Name of the macro bound to the long-term memory text in its template.
pub const LONG_MEMORY_MACRO: &str = "long_memory";

/// Name of the profile that always exists.
pub const DEFAULT_PROFILE: &str = "Default";

/// Default summarization prompt.
pub const DEFAULT_PROMPT: &str = "\
You are a summarization assistant. Summarize the given fictional narrative in a single, very short and concise statement of fact.
Responses should be no more than {{words}} words.
Include names when possible.
Response must be in the past tense.
Your response must ONLY contain the summary.

{{#if history}}
Following is a history of messages for context:
{{history}}
{{/if}}

Following is the message to summarize:
{{message}}
";

/// Default long-term injection template.
pub const DEFAULT_LONG_TEMPLATE: &str = "{{#if long_memory}}\n[Following is a list of events that occurred in the past]:\n{{long_memory}}\n{{/if}}";

/// Default short-term injection template.
pub const DEFAULT_SHORT_TEMPLATE: &str = "{{#if short_memory}}\n[Following is a list of recent events]:\n{{short_memory}}\n{{/if}}";

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prompt_carries_mandatory_macro() {
        assert!(DEFAULT_PROMPT.contains("{{message}}"));
        assert!(DEFAULT_PROMPT.contains("{{words}}"));
    }

    #[test]
    fn default_templates_gate_on_their_macro() {
        assert!(DEFAULT_SHORT_TEMPLATE.starts_with("{{#if short_memory}}"));
        assert!(DEFAULT_LONG_TEMPLATE.starts_with("{{#if long_memory}}"));
    }

    #[test]
    fn re_exports_work() {
        let _store = SettingsStore::new();
        let _settings = ProfileSettings::default();
    }
}
