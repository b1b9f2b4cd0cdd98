//! Offline-first synchronization between the local store and the per-user
//! account document.
//!
//! Five independent synchronizers (custom tiles, custom groups, disabled
//! defaults, game boards, settings) each reconcile one slice of the
//! account document against their local table. The orchestrator runs them
//! concurrently and aggregates the results; local state wins on conflicts
//! unless a force sync makes remote authoritative.

pub mod auto;
pub mod boards;
pub mod context;
pub mod disabled;
pub mod groups;
pub mod matcher;
pub mod orchestrator;
pub mod settings;
pub mod tiles;

pub use context::{SyncContext, SyncError, SyncOptions};
pub use orchestrator::SyncOrchestrator;
