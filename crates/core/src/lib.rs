//! Domain types and pure functions for the Pegasus batch client.
//!
//! This crate holds everything the orchestration engine reasons about
//! without doing I/O:
//!
//! - [`types`] — work items, lifecycle states, job records, and the
//!   per-batch [`BatchTracker`](types::BatchTracker).
//! - [`progress`] — the pure progress aggregator.
//! - [`input`] — user-input parsing and URL helpers.

pub mod error;
pub mod input;
pub mod progress;
pub mod types;

pub use error::CoreError;
pub use progress::{compute_aggregate, Aggregate, Classification};
pub use types::{BatchTracker, JobId, JobRecord, LifecycleState, WorkItem};
