//! # recall-summarize
//!
//! The summarization side of the Recall memory engine:
//!
//! - [`build_history`] — prior-message context for a summary prompt
//! - [`build_prompt`] — the full prompt for one message, with macro and
//!   conditional rendering, nesting, and prefill
//! - [`SummaryPipeline`] — sequential batch summarization with preset
//!   swapping, cancellable delays, and per-message error recording
//! - [`collect_auto_candidates`] / [`auto_summarize_batch`] — the
//!   event-driven candidate policy
//!
//! The pipeline runs as suspending sequential tasks on one logical thread.
//! Chat state is shared behind a mutex and re-read by index at every step,
//! so mutations that land during a suspended generation call are picked up
//! instead of clobbered.

#![deny(unsafe_code)]

pub mod history;
pub mod pipeline;
pub mod prompt;
pub mod trigger;

use std::sync::Arc;

use parking_lot::Mutex;
use recall_core::Chat;

pub use history::build_history;
pub use pipeline::{
    BatchOutcome, ItemOutcome, PipelineDeps, ProgressSink, SummaryPipeline,
};
pub use prompt::{DEFAULT_WORD_TARGET, build_prompt};
pub use trigger::{auto_summarize_batch, collect_auto_candidates};

/// Chat state shared between the event loop and in-flight summarizations.
pub type SharedChat = Arc<Mutex<Chat>>;

/// Wrap a chat for sharing with the pipeline.
#[must_use]
pub fn share_chat(chat: Chat) -> SharedChat {
    Arc::new(Mutex::new(chat))
}
