//! The memory engine: event dispatch, refresh, and command execution.

use std::collections::BTreeSet;

use parking_lot::Mutex;
use recall_core::text::{clean_for_title, preview};
use recall_core::{
    ChatEvent, Generator, MemoryTier, PresetBroker, ReasoningParser, TokenCounter, TurnFormatter,
};
use recall_memory::{
    EligibilityContext, ExtensionPrompt, InclusionAllocator, MessageFilter, collect_filtered,
    is_eligible, tier_injection_text,
};
use recall_settings::{
    HISTORY_MACRO, HistoryMode, ProfileSettings, SettingsRepair, SettingsStore,
};
use recall_summarize::{
    PipelineDeps, ProgressSink, SharedChat, SummaryPipeline, auto_summarize_batch, share_chat,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::commands::Command;

/// Everything the engine needs from the host chat application.
///
/// One trait bundles the leaf contracts plus the engine-facing side effects
/// (injection mounting, notifications, advisory input locking, progress).
pub trait EngineHost: Send + Sync {
    /// Token accounting.
    fn counter(&self) -> &dyn TokenCounter;
    /// Text generation.
    fn generator(&self) -> &dyn Generator;
    /// Reasoning extraction.
    fn parser(&self) -> &dyn ReasoningParser;
    /// Instruct-template turn formatting.
    fn formatter(&self) -> &dyn TurnFormatter;
    /// Preset and connection-profile switching.
    fn broker(&self) -> &dyn PresetBroker;

    /// Mount the two injection slots into the host's prompt assembly.
    fn set_extension_prompts(&self, short_term: &ExtensionPrompt, long_term: &ExtensionPrompt);
    /// Surface a non-fatal notification to the user.
    fn notify(&self, message: &str);
    /// Advisory chat-input locking while a batch summarizes.
    fn set_chat_input_blocked(&self, blocked: bool);
    /// Batch progress display (current item / total).
    fn report_progress(&self, current: usize, total: usize);
}

/// Identity of the chat the engine is currently attached to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatContext {
    /// Host chat identifier.
    pub chat_id: String,
    /// Active character's identity key.
    pub character_key: String,
    /// Group chat identifier, when the chat is a group.
    pub group_id: Option<String>,
}

/// UI surfaces the engine tracks open/closed state for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct UiState {
    popout_open: bool,
    edit_interface_open: bool,
    preview_open: bool,
}

struct HostProgress<'a, H: EngineHost>(&'a H);

impl<H: EngineHost> ProgressSink for HostProgress<'_, H> {
    fn on_progress(&self, current: usize, total: usize) {
        self.0.report_progress(current, total);
    }
}

/// The memory engine.
///
/// Owns the shared chat handle, the settings store, and per-chat transient
/// state (the swipe latch and the in-flight batch's cancellation token).
/// All mutation funnels through [`Self::handle_event`] and
/// [`Self::execute`].
pub struct MemoryEngine<H: EngineHost> {
    host: H,
    chat: SharedChat,
    store: SettingsStore,
    context: ChatContext,
    /// Index of the last swiped message; consumed by the next
    /// character-message event to tell a regenerated swipe from a new
    /// message.
    swipe_latch: Option<usize>,
    /// Cancellation token of the in-flight batch, if one is running.
    cancel: Mutex<Option<CancellationToken>>,
    ui: UiState,
}

impl<H: EngineHost> MemoryEngine<H> {
    /// Create an engine with an empty chat and default settings.
    pub fn new(host: H, context: ChatContext) -> Self {
        Self {
            host,
            chat: share_chat(recall_core::Chat::new()),
            store: SettingsStore::new(),
            context,
            swipe_latch: None,
            cancel: Mutex::new(None),
            ui: UiState::default(),
        }
    }

    /// The shared chat handle.
    #[must_use]
    pub fn chat(&self) -> &SharedChat {
        &self.chat
    }

    /// The settings store.
    #[must_use]
    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    /// Mutable settings store access.
    pub fn store_mut(&mut self) -> &mut SettingsStore {
        &mut self.store
    }

    /// Attach a different chat (host switched conversations).
    ///
    /// Follow up with a [`ChatEvent::ChatChanged`] dispatch.
    pub fn attach_chat(&mut self, chat: SharedChat, context: ChatContext) {
        self.chat = chat;
        self.context = context;
    }

    fn enabled(&self) -> bool {
        self.store.is_chat_enabled(&self.context.chat_id)
    }

    fn active_settings(&self) -> ProfileSettings {
        self.store.settings().clone()
    }

    fn disabled_characters(&self) -> Option<BTreeSet<String>> {
        self.context
            .group_id
            .as_deref()
            .and_then(|group| self.store.disabled_characters(group))
            .cloned()
    }

    fn last_index(&self) -> Option<usize> {
        self.chat.lock().last_index()
    }

    // ─── Refresh ─────────────────────────────────────────────────────────

    /// Recompute inclusion flags and remount both injection slots.
    ///
    /// Returns the concatenated injection text (long, then short), which is
    /// also what the injection preview shows. When memory is disabled for
    /// the chat, both slots are cleared instead.
    pub fn refresh(&self) -> String {
        let settings = self.active_settings();

        if !self.enabled() {
            let short = ExtensionPrompt::cleared(&settings.injection.short_term);
            let long = ExtensionPrompt::cleared(&settings.injection.long_term);
            self.host.set_extension_prompts(&short, &long);
            return String::new();
        }

        debug!("refreshing memory injections");
        let disabled = self.disabled_characters();
        let ctx = EligibilityContext {
            settings: &settings,
            disabled_characters: disabled.as_ref(),
            counter: self.host.counter(),
        };

        let (short_text, long_text) = {
            let mut guard = self.chat.lock();
            let _ = InclusionAllocator::new(ctx).recompute(&mut guard);
            (
                tier_injection_text(&guard, &ctx, MemoryTier::Short),
                tier_injection_text(&guard, &ctx, MemoryTier::Long),
            )
        };

        let short = ExtensionPrompt::new(&settings.injection.short_term, short_text);
        let long = ExtensionPrompt::new(&settings.injection.long_term, long_text);
        self.host.set_extension_prompts(&short, &long);

        format!("{}\n\n...\n\n{}", long.text, short.text)
    }

    // ─── Event dispatch ──────────────────────────────────────────────────

    /// The chat-event decision table.
    pub async fn handle_event(&mut self, event: ChatEvent) {
        debug!(?event, "chat event");
        match event {
            ChatEvent::ChatChanged => {
                self.swipe_latch = None;
                self.store
                    .auto_select(&self.context.chat_id, &self.context.character_key);
                self.repair_active_settings();
                self.validate_summary_config().await;
                let _ = self.refresh();
            }

            ChatEvent::MessageDeleted { .. } => {
                self.swipe_latch = None;
                if self.enabled() {
                    let _ = self.refresh();
                }
            }

            ChatEvent::BeforeMessage => {
                if !self.enabled() {
                    return;
                }
                let settings = self.active_settings();
                if !settings.summarization.auto_summarize
                    || !settings.summarization.auto_summarize_on_send
                {
                    return;
                }
                if self.swipe_latch.is_some() && self.swipe_latch == self.last_index() {
                    return;
                }
                self.auto_summarize().await;
            }

            ChatEvent::UserMessage { .. } => {
                self.swipe_latch = None;
                if !self.enabled() {
                    return;
                }
                let settings = self.active_settings();
                if settings.summarization.auto_summarize
                    && settings.inclusion.include_user_messages
                {
                    self.auto_summarize().await;
                }
            }

            ChatEvent::CharacterMessage { index, streaming_done } => {
                if !self.enabled() || !streaming_done {
                    return;
                }
                if self.swipe_latch == Some(index) {
                    self.handle_regenerated_swipe(index).await;
                } else {
                    self.swipe_latch = None;
                    let settings = self.active_settings();
                    if !settings.summarization.auto_summarize
                        || settings.summarization.auto_summarize_on_send
                    {
                        return;
                    }
                    self.auto_summarize().await;
                }
            }

            ChatEvent::MessageEdited { index } => {
                self.swipe_latch = None;
                if !self.enabled() {
                    return;
                }
                let settings = self.active_settings();
                if !settings.summarization.auto_summarize_on_edit {
                    return;
                }
                let should_resummarize = {
                    let guard = self.chat.lock();
                    guard.get(index).is_some_and(|message| {
                        let disabled = self.disabled_characters();
                        let ctx = EligibilityContext {
                            settings: &settings,
                            disabled_characters: disabled.as_ref(),
                            counter: self.host.counter(),
                        };
                        is_eligible(message, &ctx) && message.record().has_memory()
                    })
                };
                if should_resummarize {
                    debug!(index, "edited message had a memory, re-summarizing");
                    self.summarize_indexes(&[index]).await;
                }
            }

            ChatEvent::MessageSwiped { index } => {
                if !self.enabled() {
                    return;
                }
                // A swipe never summarizes by itself: the latch tells the
                // next character-message event this was a regeneration.
                let _ = self.refresh();
                self.swipe_latch = Some(index);
            }
        }
    }

    /// A character message re-rendered on a previously swiped index.
    async fn handle_regenerated_swipe(&mut self, index: usize) {
        let settings = self.active_settings();
        if !settings.summarization.auto_summarize_on_swipe {
            return;
        }
        let eligible_with_prior_memory = {
            let guard = self.chat.lock();
            guard.get(index).is_some_and(|message| {
                let disabled = self.disabled_characters();
                let ctx = EligibilityContext {
                    settings: &settings,
                    disabled_characters: disabled.as_ref(),
                    counter: self.host.counter(),
                };
                is_eligible(message, &ctx)
                    && message
                        .previous_swipe_record()
                        .is_some_and(recall_core::MemoryRecord::has_memory)
            })
        };
        if eligible_with_prior_memory {
            debug!(index, "re-summarizing regenerated swipe");
            self.summarize_indexes(&[index]).await;
        }
    }

    // ─── Summarization entry points ──────────────────────────────────────

    /// Run the auto-summarize policy once.
    pub async fn auto_summarize(&mut self) {
        let settings = self.active_settings();
        let disabled = self.disabled_characters();
        let indexes = {
            let guard = self.chat.lock();
            let ctx = EligibilityContext {
                settings: &settings,
                disabled_characters: disabled.as_ref(),
                counter: self.host.counter(),
            };
            auto_summarize_batch(&guard, &ctx)
        };
        if indexes.is_empty() {
            return;
        }
        info!(count = indexes.len(), "auto-summarizing");
        self.summarize_indexes(&indexes).await;
    }

    /// Summarize the given message indexes as one batch, then refresh.
    pub async fn summarize_indexes(&mut self, indexes: &[usize]) {
        if indexes.is_empty() {
            return;
        }
        let settings = self.active_settings();
        let disabled = self.disabled_characters();

        // One token per batch: a later stop() cancels exactly this run.
        let token = CancellationToken::new();
        *self.cancel.lock() = Some(token.clone());

        if settings.summarization.block_chat {
            self.host.set_chat_input_blocked(true);
        }

        let show_progress =
            settings.summarization.auto_summarize_progress && indexes.len() > 1;
        let progress = HostProgress(&self.host);

        let deps = PipelineDeps {
            generator: self.host.generator(),
            parser: self.host.parser(),
            formatter: self.host.formatter(),
            counter: self.host.counter(),
            broker: self.host.broker(),
        };
        let pipeline = SummaryPipeline::new(deps, &settings, disabled.as_ref());
        let outcome = pipeline
            .summarize_batch(
                &self.chat,
                indexes,
                &token,
                show_progress.then_some(&progress as &dyn ProgressSink),
            )
            .await;

        if settings.summarization.block_chat {
            self.host.set_chat_input_blocked(false);
        }
        *self.cancel.lock() = None;

        if outcome.failed > 0 {
            self.host.notify(&format!(
                "{} message(s) failed to summarize",
                outcome.failed
            ));
        }
        let _ = self.refresh();
    }

    /// Abort the in-flight batch, if any. Idempotent.
    pub fn stop(&self) {
        if let Some(token) = self.cancel.lock().as_ref() {
            info!("stopping summarization");
            token.cancel();
        }
        self.host.generator().request_stop();
    }

    /// Repair detectable misconfiguration on the active profile.
    ///
    /// A user-edited prompt that lost the mandatory message macro gets it
    /// re-appended, and a depth limit below the batch size is raised so auto
    /// batches are not permanently discarded. Repairs are saved back and
    /// surfaced as notifications. A history mode with no `{{history}}` macro
    /// in the prompt only warns; the prompt is left alone.
    fn repair_active_settings(&mut self) {
        let mut settings = self.active_settings();
        let repairs = settings.sanitize();
        if !repairs.is_empty() {
            for repair in &repairs {
                match repair {
                    SettingsRepair::MessageMacroAppended => self.host.notify(
                        "The {{message}} macro was missing from the summary prompt and has been re-added",
                    ),
                    SettingsRepair::MessageLimitRaised { to } => self.host.notify(&format!(
                        "The auto-summarize message limit must be at least the batch size; raised to {to}"
                    )),
                }
            }
            let name = self.store.selected_profile().to_owned();
            if let Err(err) = self.store.save_profile(&name, settings.clone()) {
                warn!(%err, "failed to save repaired settings");
            }
        }

        let history_macro = format!("{{{{{HISTORY_MACRO}}}}}");
        if settings.history.mode != HistoryMode::None
            && !settings.summarization.prompt.contains(&history_macro)
        {
            self.host.notify(
                "To include message history, the summary prompt must use the {{history}} macro",
            );
        }
    }

    /// Warn when the configured summary preset or connection profile no
    /// longer exists for the active backend.
    async fn validate_summary_config(&self) {
        let settings = self.active_settings();
        let preset = &settings.summarization.completion_preset;
        if !preset.is_empty() && !self.host.broker().preset_exists(preset).await {
            self.host.notify(&format!(
                "Summary completion preset \"{preset}\" not found; the active preset will be used"
            ));
        }
        let profile = &settings.summarization.connection_profile;
        if !profile.is_empty() && !self.host.broker().connection_profile_exists(profile).await {
            self.host.notify(&format!(
                "Summary connection profile \"{profile}\" not found; the active profile will be used"
            ));
        }
    }

    // ─── Remember / exclude toggles ──────────────────────────────────────

    /// Toggle or set the "remember" flag on a set of messages.
    ///
    /// Group toggle semantics: with no explicit value, messages are turned
    /// on individually, and only if all of them were already on is the
    /// whole set turned off. Newly remembered messages without a summary
    /// are summarized.
    pub async fn remember_toggle(&mut self, indexes: Option<Vec<usize>>, value: Option<bool>) {
        let Some(indexes) = self.resolve_indexes(indexes) else { return };

        let mut to_summarize = Vec::new();
        {
            let mut guard = self.chat.lock();
            let values = group_toggle_values(&indexes, value, |i| {
                guard.get(*i).is_some_and(|m| m.record().remember())
            });
            for (&index, set_to) in indexes.iter().zip(values) {
                if let Some(message) = guard.get_mut(index) {
                    message.record_mut().set_remember(set_to);
                    if set_to && !message.record().has_memory() {
                        to_summarize.push(index);
                    }
                    debug!(index, remember = set_to, "remember flag updated");
                }
            }
        }

        if !to_summarize.is_empty() {
            self.summarize_indexes(&to_summarize).await;
        }
        let _ = self.refresh();
    }

    /// Toggle or set the forced-exclusion flag on a set of messages.
    pub fn exclude_toggle(&mut self, indexes: Option<Vec<usize>>, value: Option<bool>) {
        let Some(indexes) = self.resolve_indexes(indexes) else { return };
        {
            let mut guard = self.chat.lock();
            let values = group_toggle_values(&indexes, value, |i| {
                guard.get(*i).is_some_and(|m| m.record().exclude())
            });
            for (&index, set_to) in indexes.iter().zip(values) {
                if let Some(message) = guard.get_mut(index) {
                    message.record_mut().set_exclude(set_to);
                    debug!(index, exclude = set_to, "exclude flag updated");
                }
            }
        }
        let _ = self.refresh();
    }

    fn resolve_indexes(&self, indexes: Option<Vec<usize>>) -> Option<Vec<usize>> {
        match indexes {
            Some(list) if !list.is_empty() => Some(list),
            Some(_) => None,
            None => self.last_index().map(|last| vec![last]),
        }
    }

    // ─── Reads ───────────────────────────────────────────────────────────

    /// Memory text for a message (default: the most recent).
    #[must_use]
    pub fn memory_for(&self, index: Option<usize>) -> Option<String> {
        let show_prefill = self.store.settings().summarization.show_prefill;
        let guard = self.chat.lock();
        let index = index.or_else(|| guard.last_index())?;
        guard
            .get(index)?
            .record()
            .memory_text(show_prefill)
    }

    /// Truncate the host's outgoing raw-message window to the configured
    /// cap, dropping from the front (oldest first).
    ///
    /// Memories carry the dropped content, so the raw window can shrink. A
    /// negative cap or disabled chat leaves the window alone.
    pub fn truncate_raw_window<T>(&self, window: &mut Vec<T>) {
        if !self.enabled() {
            return;
        }
        let cap = self.store.settings().misc.limit_injected_messages;
        if cap < 0 {
            return;
        }
        let cap = usize::try_from(cap).unwrap_or(usize::MAX);
        if window.len() > cap {
            let excess = window.len() - cap;
            let _ = window.drain(..excess);
            debug!(dropped = excess, "truncated raw message window");
        }
    }

    /// A textual table of the chat's memory state, one row per message.
    fn edit_interface_table(&self) -> String {
        let settings = self.active_settings();
        let disabled = self.disabled_characters();
        let ctx = EligibilityContext {
            settings: &settings,
            disabled_characters: disabled.as_ref(),
            counter: self.host.counter(),
        };
        let guard = self.chat.lock();
        let indexes = collect_filtered(&guard, &ctx, &MessageFilter::default(), None);

        let mut rows = Vec::with_capacity(indexes.len());
        for index in indexes {
            let Some(message) = guard.get(index) else { continue };
            let record = message.record();
            let state = match record.include() {
                Some(MemoryTier::Short) => "short",
                Some(MemoryTier::Long) => "long",
                None if record.error().is_some() => "error",
                None => "-",
            };
            let title = record
                .memory_text(settings.summarization.show_prefill)
                .map_or_else(String::new, |memory| clean_for_title(&memory, 60));
            rows.push(format!("#{index} [{state}] {title}"));
        }
        rows.join("\n")
    }

    // ─── Command surface ─────────────────────────────────────────────────

    /// Execute one command, returning its textual result if it has one.
    pub async fn execute(&mut self, command: Command) -> Option<String> {
        match command {
            Command::LogChat => {
                let guard = self.chat.lock();
                let last = guard
                    .last_index()
                    .and_then(|i| guard.get(i))
                    .map_or_else(String::new, |m| preview(m.text(), 60));
                Some(format!("{} message(s); latest: {last}", guard.len()))
            }
            Command::LogSettings => {
                serde_json::to_string_pretty(self.store.settings()).ok()
            }
            Command::HardReset => {
                warn!("hard-resetting all settings");
                self.store = SettingsStore::new();
                let _ = self.refresh();
                None
            }
            Command::Remember { index } => {
                self.remember_toggle(index.map(|i| vec![i]), None).await;
                None
            }
            Command::ForceExclude { index } => {
                self.exclude_toggle(index.map(|i| vec![i]), None);
                None
            }
            Command::ToggleChatMemory { state } => {
                let enabled = self.store.toggle_chat_enabled(&self.context.chat_id, state);
                self.host.notify(if enabled {
                    "Memory is now enabled for this chat"
                } else {
                    "Memory is now disabled for this chat"
                });
                let _ = self.refresh();
                None
            }
            Command::GetChatMemoryEnabled => Some(self.enabled().to_string()),
            Command::ToggleMemoryDisplay => {
                let mut settings = self.active_settings();
                settings.misc.display_memories = !settings.misc.display_memories;
                let name = self.store.selected_profile().to_owned();
                if let Err(err) = self.store.save_profile(&name, settings) {
                    warn!(%err, "failed to update display setting");
                }
                None
            }
            Command::ToggleConfigPopout => {
                self.ui.popout_open = !self.ui.popout_open;
                None
            }
            Command::ToggleEditInterface => {
                self.ui.edit_interface_open = !self.ui.edit_interface_open;
                self.ui.edit_interface_open.then(|| self.edit_interface_table())
            }
            Command::ToggleInjectionPreview => {
                self.ui.preview_open = !self.ui.preview_open;
                if self.ui.preview_open {
                    Some(self.refresh())
                } else {
                    None
                }
            }
            Command::SummarizeChat => {
                self.auto_summarize().await;
                None
            }
            Command::Summarize { index } => {
                let target = index.or_else(|| self.last_index());
                if let Some(target) = target {
                    self.summarize_indexes(&[target]).await;
                }
                None
            }
            Command::StopSummarization => {
                self.stop();
                None
            }
            Command::GetMemory { index } => self.memory_for(index),
        }
    }
}

/// Group toggle: explicit values apply to all; otherwise messages turn on
/// individually, and only when all of them were already on does the whole
/// set turn off.
fn group_toggle_values(
    indexes: &[usize],
    value: Option<bool>,
    mut current: impl FnMut(&usize) -> bool,
) -> Vec<bool> {
    if let Some(value) = value {
        return vec![value; indexes.len()];
    }
    let all_on = indexes.iter().all(&mut current);
    vec![!all_on; indexes.len()]
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
