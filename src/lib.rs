//! Tickloop – tick-driven behaviour composition with deterministic record/replay
//!
//! This crate implements:
//! - Activities: polling state machines stepped once per tick, composed with
//!   combinators (`once`, `when`, `unless`, `any`, `delay`, ...) into trees
//! - Sequence and stack containers with explicit ordering and termination rules
//! - A recorder that captures one state snapshot per tick and replays it later
//! - A named script registry, JSON script storage, and a tick host with
//!   disabled / autonomous / teleop phases

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Runtime core modules: activities, containers, recorder, host
pub mod runtime;

// Re-export key types for convenience
pub use runtime::{Activity, Host, Recorder, Reel, RuntimeConfig};

/// Current version of the tickloop runtime
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
