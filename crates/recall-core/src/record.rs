//! Per-swipe memory records.
//!
//! A [`MemoryRecord`] is attached to every swipe of a chat message and holds
//! the AI-generated summary together with its bookkeeping flags. All mutation
//! goes through methods that preserve the record invariants:
//!
//! - `remember` and `exclude` are mutually exclusive
//! - a record holds either a summary or an error, never both
//! - `include` is derived state, recomputed by the inclusion allocator

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Which memory tier a message's summary was allocated to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemoryTier {
    /// Recent summaries within the short-term token budget.
    Short,
    /// Older summaries flagged "remember", within the long-term budget.
    Long,
}

/// SHA-256 hex fingerprint of a message's source text.
///
/// Stored on the record when a summary is generated so that later edits to
/// the source can be detected via [`MemoryRecord::is_stale`].
#[must_use]
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Memory data for one swipe of one message.
///
/// Created empty when a message becomes eligible, populated by the
/// summarization pipeline, cleared when the swipe is replaced or the user
/// deletes the memory.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    memory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prefill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    edited: bool,
    remember: bool,
    exclude: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    include: Option<MemoryTier>,
}

impl MemoryRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Read access ─────────────────────────────────────────────────────

    /// The stored summary text, if any.
    #[must_use]
    pub fn memory(&self) -> Option<&str> {
        self.memory.as_deref()
    }

    /// The prefill stored alongside the summary, if any.
    #[must_use]
    pub fn prefill(&self) -> Option<&str> {
        self.prefill.as_deref()
    }

    /// Parsed reasoning text, if the generation produced any.
    #[must_use]
    pub fn reasoning(&self) -> Option<&str> {
        self.reasoning.as_deref()
    }

    /// Fingerprint of the source text at the time of last summarization.
    #[must_use]
    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    /// Last failure reason, if the most recent generation failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether a human manually changed the summary since last generation.
    #[must_use]
    pub fn edited(&self) -> bool {
        self.edited
    }

    /// User override forcing long-term inclusion.
    #[must_use]
    pub fn remember(&self) -> bool {
        self.remember
    }

    /// User override forcing total exclusion.
    #[must_use]
    pub fn exclude(&self) -> bool {
        self.exclude
    }

    /// Computed tier membership. Derived state owned by the inclusion
    /// allocator, never authoritative input.
    #[must_use]
    pub fn include(&self) -> Option<MemoryTier> {
        self.include
    }

    /// Whether a summary is present.
    #[must_use]
    pub fn has_memory(&self) -> bool {
        self.memory.is_some()
    }

    /// Summary text for display and injection.
    ///
    /// When `show_prefill` is set the stored prefill is prepended without
    /// mutating the record.
    #[must_use]
    pub fn memory_text(&self, show_prefill: bool) -> Option<String> {
        let memory = self.memory.as_deref()?;
        if show_prefill {
            let prefill = self.prefill.as_deref().unwrap_or("");
            Some(format!("{prefill}{memory}"))
        } else {
            Some(memory.to_owned())
        }
    }

    /// Whether the live source text no longer matches the fingerprint taken
    /// at summarization time. Nothing acts on this automatically.
    #[must_use]
    pub fn is_stale(&self, live_text: &str) -> bool {
        match &self.hash {
            Some(hash) => *hash != content_hash(live_text),
            None => false,
        }
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    /// Set the "remember" override. Setting it clears `exclude`.
    pub fn set_remember(&mut self, value: bool) {
        self.remember = value;
        if value {
            self.exclude = false;
        }
    }

    /// Set the "exclude" override. Setting it clears `remember`.
    pub fn set_exclude(&mut self, value: bool) {
        self.exclude = value;
        if value {
            self.remember = false;
        }
    }

    /// Record allocator output. Only the inclusion allocator calls this.
    pub fn set_include(&mut self, tier: Option<MemoryTier>) {
        self.include = tier;
    }

    /// Record a successful summarization.
    ///
    /// Clears any previous error and the edited flag. When reasoning was
    /// parsed out of the generation, the prefill is dropped; the reasoning
    /// string carries it inline.
    pub fn record_success(
        &mut self,
        memory: impl Into<String>,
        hash: impl Into<String>,
        prefill: Option<String>,
        reasoning: Option<String>,
    ) {
        self.memory = Some(memory.into());
        self.hash = Some(hash.into());
        self.error = None;
        self.edited = false;
        self.prefill = if reasoning.is_some() { None } else { prefill };
        self.reasoning = reasoning;
    }

    /// Record a failed summarization.
    ///
    /// Clears the summary and its companions so the record is a pure failure
    /// record.
    pub fn record_failure(&mut self, reason: impl Into<String>) {
        self.error = Some(reason.into());
        self.memory = None;
        self.prefill = None;
        self.reasoning = None;
        self.edited = false;
    }

    /// Apply a manual edit of the summary text.
    ///
    /// A no-op when the text matches the current display text. Clears error,
    /// reasoning, and prefill; marks the record edited unless the new text is
    /// empty. Deleting the text (or writing into a deleted memory) also
    /// drops the remember/exclude overrides.
    pub fn apply_edit(&mut self, text: &str, show_prefill: bool) {
        let current = self.memory_text(show_prefill).unwrap_or_default();
        if text == current {
            return;
        }
        let had_text = !current.is_empty();
        self.memory = if text.is_empty() {
            None
        } else {
            Some(text.to_owned())
        };
        self.error = None;
        self.reasoning = None;
        self.prefill = None;
        self.edited = !text.is_empty();
        if text.is_empty() || !had_text {
            self.remember = false;
            self.exclude = false;
        }
    }

    /// Reset every field to its empty state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
