//! The summarization pipeline.
//!
//! [`SummaryPipeline::summarize_batch`] walks an ordered list of message
//! indexes, summarizing each in turn. Batches are strictly sequential; the
//! only concurrency is the suspension inside the host's generation call.
//!
//! ## Contract
//!
//! - The active completion preset and connection profile are swapped to the
//!   configured summarization pair before the batch and restored after,
//!   including when the batch is cancelled partway.
//! - Cancellation is cooperative through a [`CancellationToken`] created per
//!   batch: checked between items, raced against the inter-item delay, and
//!   honored by the generator. A cancelled item leaves no error record;
//!   completed items keep their results.
//! - No failure escapes the loop. Generation errors become per-message
//!   `error` records and the batch moves on.
//! - Message state is re-read by index at every step, so chat mutations that
//!   land during a suspended generation are observed rather than clobbered.
//!   An index that fell out of range is skipped with a warning.

use std::collections::BTreeSet;
use std::time::Duration;

use recall_core::text::preview;
use recall_core::{
    GenerateRequest, GenerationError, Generator, PresetBroker, ReasoningParser, TokenCounter,
    TurnFormatter, content_hash,
};
use recall_memory::EligibilityContext;
use recall_settings::ProfileSettings;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::SharedChat;
use crate::prompt::{DEFAULT_WORD_TARGET, build_prompt};

/// Host collaborators the pipeline calls into.
#[derive(Clone, Copy)]
pub struct PipelineDeps<'a> {
    /// Text generation.
    pub generator: &'a dyn Generator,
    /// Reasoning extraction from raw output.
    pub parser: &'a dyn ReasoningParser,
    /// Instruct-template turn formatting.
    pub formatter: &'a dyn TurnFormatter,
    /// Token accounting.
    pub counter: &'a dyn TokenCounter,
    /// Preset and connection-profile switching.
    pub broker: &'a dyn PresetBroker,
}

/// Observer for batch progress. A side effect only, not part of the data
/// contract.
pub trait ProgressSink: Send + Sync {
    /// Called before each item with its 1-based position and the total.
    fn on_progress(&self, current: usize, total: usize);
}

/// What happened to one message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemOutcome {
    /// A summary was stored.
    Summarized,
    /// A failure was recorded on the message.
    Failed,
    /// Generation was aborted; the message was left untouched.
    Cancelled,
    /// The index no longer resolves to a message.
    Missing,
}

/// Tally for a whole batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Items that stored a summary.
    pub succeeded: usize,
    /// Items that recorded an error.
    pub failed: usize,
    /// Items skipped because their index no longer resolved.
    pub skipped: usize,
    /// Whether the batch stopped early on cancellation.
    pub cancelled: bool,
}

/// Sequential message summarization against a shared chat.
pub struct SummaryPipeline<'a> {
    deps: PipelineDeps<'a>,
    settings: &'a ProfileSettings,
    disabled_characters: Option<&'a BTreeSet<String>>,
    /// Known host bias prefix to strip from raw output, if configured.
    prompt_bias: Option<&'a str>,
}

impl<'a> SummaryPipeline<'a> {
    /// Create a pipeline over the given collaborators and settings.
    #[must_use]
    pub fn new(
        deps: PipelineDeps<'a>,
        settings: &'a ProfileSettings,
        disabled_characters: Option<&'a BTreeSet<String>>,
    ) -> Self {
        Self {
            deps,
            settings,
            disabled_characters,
            prompt_bias: None,
        }
    }

    /// Strip this known bias-prefix artifact from generation output.
    #[must_use]
    pub fn with_prompt_bias(mut self, bias: Option<&'a str>) -> Self {
        self.prompt_bias = bias;
        self
    }

    fn eligibility_ctx(&self) -> EligibilityContext<'a> {
        EligibilityContext {
            settings: self.settings,
            disabled_characters: self.disabled_characters,
            counter: self.deps.counter,
        }
    }

    /// The `{{words}}` value: the summary preset's max-token setting, or the
    /// current preset's when none is configured.
    async fn word_target(&self) -> usize {
        let configured = &self.settings.summarization.completion_preset;
        let preset = if configured.is_empty() {
            self.deps.broker.current_preset().await
        } else {
            configured.clone()
        };
        self.deps
            .broker
            .preset_max_tokens(&preset)
            .await
            .unwrap_or(DEFAULT_WORD_TARGET)
    }

    // ─── Single message ──────────────────────────────────────────────────

    /// Summarize one message, replacing any existing memory.
    ///
    /// Normally called through [`Self::summarize_batch`], which handles the
    /// preset swap around it.
    pub async fn summarize_one(&self, chat: &SharedChat, index: usize) -> ItemOutcome {
        let word_target = self.word_target().await;

        // Snapshot text and prompt under the lock, then release it for the
        // duration of the generation call.
        let (prompt, hash) = {
            let guard = chat.lock();
            let Some(message) = guard.get(index) else {
                warn!(index, "message vanished before summarization");
                return ItemOutcome::Missing;
            };
            let hash = content_hash(message.text());
            let Some(prompt) = build_prompt(
                &guard,
                index,
                &self.eligibility_ctx(),
                self.deps.formatter,
                word_target,
            ) else {
                return ItemOutcome::Missing;
            };
            (prompt, hash)
        };

        let prompt_tokens = self.deps.counter.count_tokens(&prompt);
        let window = self.deps.counter.max_context_window();
        if prompt_tokens > window {
            warn!(index, prompt_tokens, window, "summary prompt exceeds context window");
        }

        debug!(index, prompt_tokens, "summarizing message");
        let result = self
            .deps
            .generator
            .generate(GenerateRequest {
                prompt,
                quiet: true,
                system_prompt: None,
                include_scan_sources: self.settings.summarization.include_world_info,
            })
            .await;

        match result {
            Ok(raw) if !raw.trim().is_empty() => self.store_success(chat, index, &hash, raw),
            Ok(_) => self.store_failure(chat, index, &GenerationError::Empty.to_string()),
            Err(GenerationError::Aborted) => {
                info!(index, "summarization aborted");
                ItemOutcome::Cancelled
            }
            Err(err) => self.store_failure(chat, index, &err.to_string()),
        }
    }

    fn store_success(
        &self,
        chat: &SharedChat,
        index: usize,
        hash: &str,
        raw: String,
    ) -> ItemOutcome {
        let raw = match self.prompt_bias {
            Some(bias) if !bias.is_empty() => {
                raw.strip_prefix(bias).map_or(raw.clone(), str::to_owned)
            }
            _ => raw,
        };

        // Reasoning is parsed with the prefill attached: if reasoning comes
        // back, it carries the prefill inline and nothing is stored in the
        // prefill slot. The persisted memory never includes the prefill.
        let prefill = &self.settings.summarization.prefill;
        let prefilled = format!("{prefill}{raw}");
        let parsed = self.deps.parser.parse(&prefilled);

        let memory = if parsed.reasoning.is_some() {
            parsed.content
        } else {
            raw
        };
        let stored_prefill = (!prefill.is_empty()).then(|| prefill.clone());
        debug!(index, summary = %preview(&memory, 80), "summary stored");

        let mut guard = chat.lock();
        let Some(message) = guard.get_mut(index) else {
            warn!(index, "message vanished during summarization");
            return ItemOutcome::Missing;
        };
        message
            .record_mut()
            .record_success(memory, hash, stored_prefill, parsed.reasoning);
        ItemOutcome::Summarized
    }

    fn store_failure(&self, chat: &SharedChat, index: usize, reason: &str) -> ItemOutcome {
        warn!(index, reason, "summarization failed");
        let mut guard = chat.lock();
        let Some(message) = guard.get_mut(index) else {
            warn!(index, "message vanished during summarization");
            return ItemOutcome::Missing;
        };
        message.record_mut().record_failure(reason);
        ItemOutcome::Failed
    }

    // ─── Batch ───────────────────────────────────────────────────────────

    /// Summarize the given indexes in caller order.
    pub async fn summarize_batch(
        &self,
        chat: &SharedChat,
        indexes: &[usize],
        cancel: &CancellationToken,
        progress: Option<&dyn ProgressSink>,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        if indexes.is_empty() {
            return outcome;
        }
        debug!(count = indexes.len(), "starting summarization batch");

        let saved_profile = self.deps.broker.current_connection_profile().await;
        let saved_preset = self.deps.broker.current_preset().await;
        self.apply_summary_presets().await;

        let delay = self.settings.summarization.time_delay_seconds;
        let total = indexes.len();

        for (n, &index) in indexes.iter().enumerate() {
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                break;
            }
            if let Some(sink) = progress {
                sink.on_progress(n + 1, total);
            }

            match self.summarize_one(chat, index).await {
                ItemOutcome::Summarized => outcome.succeeded += 1,
                ItemOutcome::Failed => outcome.failed += 1,
                ItemOutcome::Missing => outcome.skipped += 1,
                ItemOutcome::Cancelled => {
                    outcome.cancelled = true;
                    break;
                }
            }

            // Inter-item delay, raced against cancellation. The last item
            // gets none.
            if delay > 0 && n + 1 < total {
                if cancel.is_cancelled() {
                    outcome.cancelled = true;
                    break;
                }
                debug!(seconds = delay, "delaying before next summarization");
                tokio::select! {
                    () = cancel.cancelled() => {
                        outcome.cancelled = true;
                        break;
                    }
                    () = tokio::time::sleep(Duration::from_secs(delay)) => {}
                }
            }
        }

        // Restore the caller's preset pair even when the batch stopped
        // early. Connection profile first: switching it resets the preset.
        self.deps.broker.set_connection_profile(&saved_profile).await;
        self.deps.broker.set_preset(&saved_preset).await;

        info!(
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            skipped = outcome.skipped,
            cancelled = outcome.cancelled,
            "summarization batch finished"
        );
        outcome
    }

    /// Switch to the configured summarization preset/profile.
    ///
    /// An empty name keeps the caller's selection; a name that no longer
    /// exists for the active backend degrades to the same, with a warning.
    async fn apply_summary_presets(&self) {
        let summarization = &self.settings.summarization;

        let profile = &summarization.connection_profile;
        if !profile.is_empty() {
            if self.deps.broker.connection_profile_exists(profile).await {
                self.deps.broker.set_connection_profile(profile).await;
            } else {
                warn!(profile, "configured summary connection profile not found, keeping current");
            }
        }

        let preset = &summarization.completion_preset;
        if !preset.is_empty() {
            if self.deps.broker.preset_exists(preset).await {
                self.deps.broker.set_preset(preset).await;
            } else {
                warn!(preset, "configured summary preset not found, keeping current");
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
