//! The programmatic command surface.
//!
//! Each command mirrors one operation the host exposes to users. Commands
//! take at most one optional index or boolean argument and return either
//! nothing or a string; execution lives in
//! [`MemoryEngine::execute`](crate::engine::MemoryEngine::execute).

use serde::{Deserialize, Serialize};

/// A named operation on the memory engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    /// Log the current chat state; returns a short description.
    LogChat,
    /// Return the active profile's settings as JSON.
    LogSettings,
    /// Reset every profile and global state to compiled defaults.
    HardReset,
    /// Toggle the "remember" status of a message (default: most recent).
    Remember {
        /// Target message index.
        index: Option<usize>,
    },
    /// Toggle the forced-exclusion status of a message (default: most recent).
    ForceExclude {
        /// Target message index.
        index: Option<usize>,
    },
    /// Set or toggle memory enablement for the current chat.
    ToggleChatMemory {
        /// Explicit state; toggles when absent.
        state: Option<bool>,
    },
    /// Return whether memory is enabled for the current chat.
    GetChatMemoryEnabled,
    /// Toggle the display-memories setting on the active profile.
    ToggleMemoryDisplay,
    /// Toggle the configuration popout surface.
    ToggleConfigPopout,
    /// Toggle the memory edit surface; returns its table when opened.
    ToggleEditInterface,
    /// Toggle the injection preview; returns the preview when opened.
    ToggleInjectionPreview,
    /// Run the auto-summarization policy once, even if auto mode is off.
    SummarizeChat,
    /// Summarize one message (default: most recent).
    Summarize {
        /// Target message index.
        index: Option<usize>,
    },
    /// Abort any summarization taking place.
    StopSummarization,
    /// Return the memory text for a message (default: most recent).
    GetMemory {
        /// Target message index.
        index: Option<usize>,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_tagged_form() {
        let json = serde_json::to_value(Command::Remember { index: Some(4) }).unwrap();
        assert_eq!(json["command"], "remember");
        assert_eq!(json["index"], 4);
    }

    #[test]
    fn optional_argument_roundtrip() {
        let command = Command::ToggleChatMemory { state: Some(false) };
        let json = serde_json::to_string(&command).unwrap();
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(command, back);
    }

    #[test]
    fn bare_command_parses_without_argument() {
        let command: Command = serde_json::from_str(r#"{"command": "summarize"}"#).unwrap();
        assert_eq!(command, Command::Summarize { index: None });
    }
}
