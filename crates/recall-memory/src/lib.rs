//! # recall-memory
//!
//! The memory inclusion engine: decides which messages' summaries occupy
//! short-term and long-term memory, and renders the two injection blocks.
//!
//! - [`is_eligible`] — per-message eligibility, independent of token budgets
//! - [`MessageFilter`] — AND-gate composition for bulk selection
//! - [`InclusionAllocator`] — the backward-pass budget algorithm that tags
//!   every message with its tier membership
//! - [`tier_injection_text`] / [`ExtensionPrompt`] — template-rendered
//!   injection blocks for the host to mount

#![deny(unsafe_code)]

pub mod allocator;
pub mod budget;
pub mod classifier;
pub mod injection;

pub use allocator::{AllocationSummary, InclusionAllocator};
pub use budget::TokenBudget;
pub use classifier::{EligibilityContext, MessageFilter, collect_filtered, is_eligible, matches_filter};
pub use injection::{ExtensionPrompt, concatenate_memories, tier_injection_text};
