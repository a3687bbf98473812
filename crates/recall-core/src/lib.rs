//! # recall-core
//!
//! Foundation types for the Recall memory engine.
//!
//! This crate provides the shared vocabulary the other Recall crates build on:
//!
//! - **Chat model**: [`Chat`] and [`ChatMessage`] with per-message swipe state
//! - **Memory records**: [`MemoryRecord`] attached to each swipe, holding the
//!   generated summary and its inclusion flags
//! - **Host traits**: [`TokenCounter`], [`Generator`], [`ReasoningParser`],
//!   [`TurnFormatter`], [`PresetBroker`] — the contracts the host chat
//!   application implements
//! - **Events**: [`ChatEvent`] — typed chat lifecycle notifications
//! - **Errors**: [`GenerationError`] via `thiserror`

#![deny(unsafe_code)]

pub mod errors;
pub mod events;
pub mod host;
pub mod messages;
pub mod record;
pub mod text;

pub use errors::GenerationError;
pub use events::ChatEvent;
pub use host::{
    GenerateRequest, Generator, ParsedReasoning, PresetBroker, ReasoningParser, TokenCounter,
    TurnFormatter,
};
pub use messages::{Chat, ChatMessage, Sender};
pub use record::{MemoryRecord, MemoryTier, content_hash};
