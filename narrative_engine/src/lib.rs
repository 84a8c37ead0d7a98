//! # Narrative Engine (The Cortex)
//!
//! The "brain" of the narrative game loop. This crate interfaces with
//! `game_schema`, recovers structured replies from an unreliable generative
//! text service, and keeps the canonical per-session game state consistent.
//!
//! ## Core Components
//!
//! - **response**: Parses raw generative output into a [`NarrativeResponse`]
//!   via an ordered cascade of JSON repair strategies. Never fails.
//! - **state**: The canonical [`GameState`] aggregate - shape normalization,
//!   deep merges, world-time consolidation, combat lifecycle, and
//!   narrative/state consistency checks.
//! - **config**: Tunable consistency thresholds loaded from TOML.
//!
//! ## Design Philosophy
//!
//! - **Never raise on bad text**: the generative service will truncate,
//!   prefix, and mangle its replies; parsing always produces a best-effort
//!   result.
//! - **Two-tier errors**: structural validation problems surface as typed
//!   errors; malformed numbers and drifted shapes are silently repaired.
//! - **Pure computation**: no I/O, no retries, no locking; the caller
//!   serializes turns per session.

pub mod config;
pub mod response;
pub mod state;

pub use config::*;
pub use response::*;
pub use state::*;
