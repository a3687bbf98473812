//! Chat and message model.
//!
//! The host chat application owns the real message list; this model mirrors
//! the attach points the memory engine needs. A message's identity is its
//! integer position in the [`Chat`], stable per message rather than per content.
//!
//! Each message carries one or more swipes (alternate generations). Exactly
//! one swipe is active, and every swipe has its own [`MemoryRecord`].

use serde::{Deserialize, Serialize};

use crate::record::MemoryRecord;

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Sender {
    /// The human user.
    User,
    /// An AI character.
    Character,
    /// The narrator voice (system-authored story text).
    Narrator,
}

/// One alternate generation of a message position.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Swipe {
    /// The swipe's message text.
    pub text: String,
    /// Memory data attached to this swipe.
    pub record: MemoryRecord,
}

/// A single message in the chat log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Display name of the sender.
    pub name: String,
    /// Sender classification.
    pub sender: Sender,
    /// Per-character identity key (group-chat granularity).
    pub character_key: String,
    /// Hidden/system message (not shown as story text).
    pub hidden: bool,
    /// Marked as a "thought" aside.
    pub thought: bool,
    /// Injected by the memory engine itself; never summarized.
    pub engine_notice: bool,
    swipes: Vec<Swipe>,
    active_swipe: usize,
}

impl ChatMessage {
    /// Create a message with a single swipe.
    #[must_use]
    pub fn new(sender: Sender, name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sender,
            character_key: String::new(),
            hidden: false,
            thought: false,
            engine_notice: false,
            swipes: vec![Swipe {
                text: text.into(),
                record: MemoryRecord::new(),
            }],
            active_swipe: 0,
        }
    }

    /// Create a user message.
    #[must_use]
    pub fn user(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(Sender::User, name, text)
    }

    /// Create a character message with its identity key.
    #[must_use]
    pub fn character(
        name: impl Into<String>,
        character_key: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let mut message = Self::new(Sender::Character, name, text);
        message.character_key = character_key.into();
        message
    }

    /// Create a narrator message.
    #[must_use]
    pub fn narrator(text: impl Into<String>) -> Self {
        Self::new(Sender::Narrator, "Narrator", text)
    }

    /// Mark as hidden/system.
    #[must_use]
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Mark as a thought aside.
    #[must_use]
    pub fn with_thought(mut self, thought: bool) -> Self {
        self.thought = thought;
        self
    }

    /// Mark as an engine-injected notice.
    #[must_use]
    pub fn with_engine_notice(mut self, notice: bool) -> Self {
        self.engine_notice = notice;
        self
    }

    // ─── Swipe state ─────────────────────────────────────────────────────

    /// Text of the active swipe.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.swipes[self.active_swipe].text
    }

    /// Replace the active swipe's text (a message edit).
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.swipes[self.active_swipe].text = text.into();
    }

    /// Memory record of the active swipe.
    #[must_use]
    pub fn record(&self) -> &MemoryRecord {
        &self.swipes[self.active_swipe].record
    }

    /// Mutable memory record of the active swipe.
    pub fn record_mut(&mut self) -> &mut MemoryRecord {
        &mut self.swipes[self.active_swipe].record
    }

    /// Number of swipes at this position.
    #[must_use]
    pub fn swipe_count(&self) -> usize {
        self.swipes.len()
    }

    /// Index of the active swipe.
    #[must_use]
    pub fn active_swipe(&self) -> usize {
        self.active_swipe
    }

    /// Append a fresh, never-generated swipe and activate it.
    ///
    /// The new swipe starts with an empty record, per the record lifecycle:
    /// switching to a fresh variant never inherits the old summary.
    pub fn begin_swipe(&mut self, text: impl Into<String>) {
        self.swipes.push(Swipe {
            text: text.into(),
            record: MemoryRecord::new(),
        });
        self.active_swipe = self.swipes.len() - 1;
    }

    /// Activate an existing swipe, keeping its record.
    ///
    /// Out-of-range indexes are ignored.
    pub fn set_active_swipe(&mut self, index: usize) {
        if index < self.swipes.len() {
            self.active_swipe = index;
        }
    }

    /// Record of the swipe preceding the active one, if any.
    ///
    /// Used by the swipe trigger to decide whether a regenerated swipe's
    /// predecessor had a summary worth regenerating.
    #[must_use]
    pub fn previous_swipe_record(&self) -> Option<&MemoryRecord> {
        let prev = self.active_swipe.checked_sub(1)?;
        self.swipes.get(prev).map(|swipe| &swipe.record)
    }
}

/// An ordered chat log.
///
/// Thin wrapper over the message vector; indexes are the message identities
/// used throughout the engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    messages: Vec<ChatMessage>,
}

impl Chat {
    /// Create an empty chat.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chat from messages.
    #[must_use]
    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }

    /// Message at the given index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ChatMessage> {
        self.messages.get(index)
    }

    /// Mutable message at the given index.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut ChatMessage> {
        self.messages.get_mut(index)
    }

    /// Append a message, returning its index.
    pub fn push(&mut self, message: ChatMessage) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    /// Delete the message at the given index. Later messages shift down.
    pub fn remove(&mut self, index: usize) -> Option<ChatMessage> {
        if index < self.messages.len() {
            Some(self.messages.remove(index))
        } else {
            None
        }
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the chat has no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Index of the most recent message, if any.
    #[must_use]
    pub fn last_index(&self) -> Option<usize> {
        self.messages.len().checked_sub(1)
    }

    /// Iterate over messages in chronological order.
    pub fn iter(&self) -> std::slice::Iter<'_, ChatMessage> {
        self.messages.iter()
    }

    /// Iterate mutably over messages in chronological order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, ChatMessage> {
        self.messages.iter_mut()
    }
}

impl<'a> IntoIterator for &'a Chat {
    type Item = &'a ChatMessage;
    type IntoIter = std::slice::Iter<'a, ChatMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // -- Construction --

    #[test]
    fn user_message_defaults() {
        let message = ChatMessage::user("Alice", "hello");
        assert_eq!(message.sender, Sender::User);
        assert_eq!(message.text(), "hello");
        assert!(!message.hidden);
        assert!(!message.thought);
        assert_eq!(message.swipe_count(), 1);
    }

    #[test]
    fn character_message_carries_key() {
        let message = ChatMessage::character("Kira", "kira.png", "hi");
        assert_eq!(message.sender, Sender::Character);
        assert_eq!(message.character_key, "kira.png");
    }

    #[test]
    fn builder_flags() {
        let message = ChatMessage::narrator("scene").with_hidden(true).with_thought(true);
        assert!(message.hidden);
        assert!(message.thought);
    }

    // -- Swipes --

    #[test]
    fn begin_swipe_activates_fresh_record() {
        let mut message = ChatMessage::character("Kira", "k", "first");
        message
            .record_mut()
            .record_success("sum", "h", None, None);

        message.begin_swipe("second");
        assert_eq!(message.text(), "second");
        assert!(!message.record().has_memory());
        assert_eq!(message.swipe_count(), 2);
    }

    #[test]
    fn switching_back_restores_old_record() {
        let mut message = ChatMessage::character("Kira", "k", "first");
        message.record_mut().record_success("sum", "h", None, None);
        message.begin_swipe("second");

        message.set_active_swipe(0);
        assert_eq!(message.text(), "first");
        assert_eq!(message.record().memory(), Some("sum"));
    }

    #[test]
    fn set_active_swipe_out_of_range_ignored() {
        let mut message = ChatMessage::user("A", "x");
        message.set_active_swipe(7);
        assert_eq!(message.active_swipe(), 0);
    }

    #[test]
    fn previous_swipe_record_lookup() {
        let mut message = ChatMessage::character("Kira", "k", "first");
        assert!(message.previous_swipe_record().is_none());

        message.record_mut().record_success("old sum", "h", None, None);
        message.begin_swipe("second");
        let prev = message.previous_swipe_record().unwrap();
        assert_eq!(prev.memory(), Some("old sum"));
    }

    // -- Chat --

    #[test]
    fn push_returns_index() {
        let mut chat = Chat::new();
        assert_eq!(chat.push(ChatMessage::user("A", "one")), 0);
        assert_eq!(chat.push(ChatMessage::user("A", "two")), 1);
        assert_eq!(chat.len(), 2);
        assert_eq!(chat.last_index(), Some(1));
    }

    #[test]
    fn remove_shifts_later_messages() {
        let mut chat = Chat::from_messages(vec![
            ChatMessage::user("A", "one"),
            ChatMessage::user("A", "two"),
            ChatMessage::user("A", "three"),
        ]);
        let removed = chat.remove(1).unwrap();
        assert_eq!(removed.text(), "two");
        assert_eq!(chat.get(1).unwrap().text(), "three");
    }

    #[test]
    fn remove_out_of_range_is_none() {
        let mut chat = Chat::new();
        assert!(chat.remove(0).is_none());
    }

    #[test]
    fn empty_chat() {
        let chat = Chat::new();
        assert!(chat.is_empty());
        assert!(chat.last_index().is_none());
        assert!(chat.get(0).is_none());
    }

    #[test]
    fn serde_roundtrip_preserves_swipe_state() {
        let mut chat = Chat::new();
        let _ = chat.push(ChatMessage::character("Kira", "k", "first"));
        chat.get_mut(0).unwrap().begin_swipe("second");

        let json = serde_json::to_string(&chat).unwrap();
        let back: Chat = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(0).unwrap().active_swipe(), 1);
        assert_eq!(back, chat);
    }
}
