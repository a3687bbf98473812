//! # recall-engine
//!
//! The top of the Recall stack: owns the chat, settings store, and host
//! handle, dispatches chat lifecycle events through a typed decision table,
//! refreshes the two injection slots, and exposes the programmatic command
//! surface.
//!
//! Everything below this crate is policy-free machinery; this is where the
//! event-driven behavior lives.

#![deny(unsafe_code)]

pub mod commands;
pub mod engine;

pub use commands::Command;
pub use engine::{ChatContext, EngineHost, MemoryEngine};
