//! Per-document AI attribution: store, fetch coordination, aggregation.
//!
//! - `store`: keyed per-document records, the single lock, host event entry
//!   points
//! - `coordinator`: single-flight fetches, generation tokens, cancellation
//! - `debounce`: quiet-window timers for edit bursts
//! - `state`: the pure (phase, event) -> (phase, actions) transition table
//! - `aggregate`: totals, selection groups, anchors, highlight buckets
//! - `color`: deterministic prompt-to-palette hashing
//! - `provider`: the boundary to the external attribution tool

pub mod aggregate;
pub mod color;
pub mod coordinator;
pub mod debounce;
pub mod provider;
pub mod state;
pub mod store;

pub use provider::{BlameProvider, GitAiProvider};
pub use store::{BlameStore, DocSnapshot, SharedStore};
