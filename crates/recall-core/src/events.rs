//! Chat lifecycle events.
//!
//! The host dispatches one [`ChatEvent`] per chat mutation. Each variant
//! carries its own typed payload and is handled by a single `match` in the
//! engine's decision table.

use serde::{Deserialize, Serialize};

/// A chat lifecycle notification from the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChatEvent {
    /// The active chat was switched.
    ChatChanged,
    /// A message was deleted.
    MessageDeleted {
        /// Index the message occupied before removal.
        index: usize,
    },
    /// A new outgoing message is about to be sent.
    BeforeMessage,
    /// A user message finished rendering.
    UserMessage {
        /// Index of the new message.
        index: usize,
    },
    /// A character message finished rendering.
    CharacterMessage {
        /// Index of the new message.
        index: usize,
        /// False while the host is still streaming tokens into it.
        streaming_done: bool,
    },
    /// An existing message's text was edited.
    MessageEdited {
        /// Index of the edited message.
        index: usize,
    },
    /// A message's active swipe changed.
    MessageSwiped {
        /// Index of the swiped message.
        index: usize,
    },
}

impl ChatEvent {
    /// The message index this event refers to, if it targets one message.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::MessageDeleted { index }
            | Self::UserMessage { index }
            | Self::CharacterMessage { index, .. }
            | Self::MessageEdited { index }
            | Self::MessageSwiped { index } => Some(*index),
            Self::ChatChanged | Self::BeforeMessage => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_extraction() {
        assert_eq!(ChatEvent::ChatChanged.index(), None);
        assert_eq!(ChatEvent::BeforeMessage.index(), None);
        assert_eq!(ChatEvent::MessageDeleted { index: 3 }.index(), Some(3));
        assert_eq!(
            ChatEvent::CharacterMessage { index: 9, streaming_done: true }.index(),
            Some(9)
        );
    }

    #[test]
    fn serde_tagged_form() {
        let json = serde_json::to_value(ChatEvent::MessageSwiped { index: 2 }).unwrap();
        assert_eq!(json["type"], "messageSwiped");
        assert_eq!(json["index"], 2);
    }

    #[test]
    fn serde_roundtrip() {
        let event = ChatEvent::CharacterMessage { index: 4, streaming_done: false };
        let json = serde_json::to_string(&event).unwrap();
        let back: ChatEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
