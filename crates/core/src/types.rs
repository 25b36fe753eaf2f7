//! Work items, job lifecycle states, and per-batch accounting.
//!
//! [`BatchTracker`] is the shared accounting structure for one submitted
//! batch. The submission coordinator fills it as requests go out and the
//! job registry resolves entries as terminal events arrive. Its invariant:
//! `completed + failed + |pending| <= total` at all times, with equality
//! once every item has been dispatched.

use std::collections::HashMap;

use serde::Serialize;

/// Service-assigned job identifier. Opaque to the client.
pub type JobId = String;

/// One user-supplied unit of work (a media URL). Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// The raw source URL as entered by the user.
    pub source: String,
}

impl WorkItem {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Lifecycle states
// ---------------------------------------------------------------------------

/// Lifecycle of a single job, as reported by the event stream.
///
/// `Submitted` is assigned locally when the submission endpoint returns a
/// `job_id`, before any stream event for that job has arrived. `Completed`
/// and `Failed` are terminal: once a record reaches either, no further
/// transitions are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LifecycleState {
    Submitted,
    Downloading,
    Completed,
    Failed,
}

impl LifecycleState {
    /// Whether this state accepts no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Map a wire status string to a lifecycle state.
    ///
    /// `completed` and `error`/`failed` map to the terminal states; any
    /// other status (including `downloading`, `processing`, `starting`)
    /// is treated as an indeterminate in-progress signal.
    pub fn from_status(status: &str) -> Self {
        match status {
            "completed" => Self::Completed,
            "error" | "failed" => Self::Failed,
            _ => Self::Downloading,
        }
    }
}

/// One tracked job: the originating item plus its last-known state.
///
/// Owned exclusively by the job registry. `terminal_at` is stamped when
/// the record reaches a terminal state and drives retention-based
/// eviction.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub job_id: JobId,
    pub item: WorkItem,
    pub state: LifecycleState,
    pub last_message: Option<String>,
    pub terminal_at: Option<std::time::Instant>,
}

impl JobRecord {
    /// Create a fresh record in `Submitted` state.
    pub fn new(job_id: JobId, item: WorkItem) -> Self {
        Self {
            job_id,
            item,
            state: LifecycleState::Submitted,
            last_message: None,
            terminal_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Batch tracker
// ---------------------------------------------------------------------------

/// Accounting for one submitted batch.
///
/// `pending` holds every job that has been registered but not yet seen a
/// terminal event. Items whose submission failed outright never enter
/// `pending` (they have no `job_id`); they are counted via
/// [`record_immediate_failure`](Self::record_immediate_failure).
#[derive(Debug, Clone, Default)]
pub struct BatchTracker {
    total: usize,
    completed: usize,
    failed: usize,
    pending: HashMap<JobId, WorkItem>,
}

impl BatchTracker {
    /// Create a tracker for a batch of `total` items.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            failed: 0,
            pending: HashMap::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Track a successfully submitted job as pending.
    pub fn track(&mut self, job_id: JobId, item: WorkItem) {
        self.pending.insert(job_id, item);
        debug_assert!(self.completed + self.failed + self.pending.len() <= self.total);
    }

    /// Count an item whose submission failed before it got a `job_id`.
    pub fn record_immediate_failure(&mut self) {
        self.failed += 1;
        debug_assert!(self.completed + self.failed + self.pending.len() <= self.total);
    }

    /// Resolve a pending job with a terminal outcome.
    ///
    /// Removes the job from `pending` and increments exactly one counter.
    /// Returns `None` if the job is not pending (already resolved or never
    /// tracked), in which case nothing changes.
    pub fn resolve(&mut self, job_id: &str, outcome: LifecycleState) -> Option<WorkItem> {
        debug_assert!(outcome.is_terminal());
        let item = self.pending.remove(job_id)?;
        match outcome {
            LifecycleState::Completed => self.completed += 1,
            LifecycleState::Failed => self.failed += 1,
            _ => unreachable!("resolve called with non-terminal state"),
        }
        Some(item)
    }

    /// Whether every item in the batch has reached a terminal outcome.
    pub fn is_exhausted(&self) -> bool {
        self.completed + self.failed == self.total
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
