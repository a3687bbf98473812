//! Host interface traits.
//!
//! The memory engine never talks to a model backend, tokenizer, or settings
//! UI directly. The host chat application implements these contracts and
//! injects them. The split keeps every algorithm testable with hand-rolled
//! mocks.

use async_trait::async_trait;

use crate::errors::GenerationError;

/// Token accounting provided by the host.
pub trait TokenCounter: Send + Sync {
    /// Count tokens in a piece of text.
    fn count_tokens(&self, text: &str) -> usize;
    /// The model's current context window, in tokens.
    fn max_context_window(&self) -> usize;
}

/// A generation request.
#[derive(Clone, Debug)]
pub struct GenerateRequest {
    /// Fully rendered prompt text.
    pub prompt: String,
    /// Background mode: the result is not rendered as a chat message.
    pub quiet: bool,
    /// Optional system prompt for backends that require one.
    pub system_prompt: Option<String>,
    /// Whether the host should add its scan-source (world info) text.
    pub include_scan_sources: bool,
}

/// The host's text-generation call.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Run a background generation and return the raw model output.
    async fn generate(&self, request: GenerateRequest) -> Result<String, GenerationError>;

    /// Ask the host to abort any in-flight generation.
    ///
    /// Idempotent; a no-op when nothing is running.
    fn request_stop(&self);
}

/// Result of splitting model output into reasoning and content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedReasoning {
    /// "Thinking" text the model emitted before its answer, if any.
    pub reasoning: Option<String>,
    /// The visible answer with reasoning stripped.
    pub content: String,
}

/// The host's reasoning-extraction convention.
pub trait ReasoningParser: Send + Sync {
    /// Split raw output into reasoning and content.
    fn parse(&self, text: &str) -> ParsedReasoning;
}

/// Renders one line into the host's instruction-template convention.
pub trait TurnFormatter: Send + Sync {
    /// Format a single chat turn.
    fn format_turn(&self, name: &str, text: &str, is_user: bool, is_system_note: bool) -> String;

    /// The template's output-priming sequence, appended to prompts so the
    /// model answers in assistant voice.
    fn output_sequence(&self) -> String;
}

/// Completion-preset and connection-profile switching.
///
/// The pipeline swaps to a dedicated summarization preset/profile for the
/// duration of a batch and restores the caller's selection afterwards.
#[async_trait]
pub trait PresetBroker: Send + Sync {
    /// Name of the currently active completion preset.
    async fn current_preset(&self) -> String;
    /// Activate a completion preset by name.
    async fn set_preset(&self, name: &str);
    /// Whether a preset with this name exists for the active backend.
    async fn preset_exists(&self, name: &str) -> bool;
    /// The preset's configured max response tokens, if known.
    async fn preset_max_tokens(&self, name: &str) -> Option<usize>;

    /// Name of the currently active connection profile.
    async fn current_connection_profile(&self) -> String;
    /// Activate a connection profile by name.
    async fn set_connection_profile(&self, name: &str);
    /// Whether a connection profile with this name exists.
    async fn connection_profile_exists(&self, name: &str) -> bool;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
