//! Job registry: the authoritative map from service-assigned `job_id`
//! to the originating work item and its last-known lifecycle state.
//!
//! Entries are inserted at submission time, updated as stream events
//! arrive, and evicted a fixed retention period after reaching a
//! terminal state. Eviction only bounds memory — the batch tracker's
//! counters are finalized at the terminal transition and are never
//! touched by a sweep.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use pegasus_core::{BatchTracker, JobRecord, LifecycleState, WorkItem};

use crate::messages::ProgressEvent;

/// How long a terminal record is retained before eviction.
pub const TERMINAL_RETENTION: Duration = Duration::from_secs(60);

/// Outcome of applying one stream event to the registry.
#[derive(Debug, Clone)]
pub enum EventOutcome {
    /// The event referenced no tracked job. Expected under normal
    /// operation (stale events, other sessions); ignored silently.
    Untracked,
    /// The job is already terminal; the event was an idempotent no-op.
    AlreadyTerminal,
    /// The job moved to (or stayed in) a non-terminal state.
    Progressed { item: WorkItem },
    /// The job reached a terminal state for the first time. The tracker
    /// was updated exactly once.
    Finished {
        item: WorkItem,
        state: LifecycleState,
    },
}

/// Registry of in-flight and recently finished jobs.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: HashMap<String, JobRecord>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Drop every record. Called when a new batch replaces the session's
    /// tracker, so that stale events from the previous batch fall into
    /// the untracked path.
    pub fn clear(&mut self) {
        self.jobs.clear();
    }

    /// Look up a record by job id.
    pub fn get(&self, job_id: &str) -> Option<&JobRecord> {
        self.jobs.get(job_id)
    }

    /// Register a freshly submitted job in `Submitted` state and add it
    /// to the batch's pending set.
    ///
    /// A duplicate `job_id` is a logged no-op — the original record and
    /// the tracker are left untouched.
    pub fn register(&mut self, tracker: &mut BatchTracker, job_id: &str, item: WorkItem) {
        if self.jobs.contains_key(job_id) {
            tracing::warn!(job_id, "Duplicate job registration ignored");
            return;
        }
        tracker.track(job_id.to_string(), item.clone());
        self.jobs
            .insert(job_id.to_string(), JobRecord::new(job_id.to_string(), item));
        tracing::debug!(job_id, "Job registered");
    }

    /// Apply one lifecycle event from the stream.
    ///
    /// Untracked jobs and already-terminal records are ignored. Otherwise
    /// the mapped state is written, `last_message` updated, and a first
    /// terminal transition removes the job from the tracker's pending set
    /// and increments the matching counter exactly once.
    pub fn apply_event(&mut self, tracker: &mut BatchTracker, event: &ProgressEvent) -> EventOutcome {
        let Some(record) = self.jobs.get_mut(&event.job_id) else {
            tracing::debug!(job_id = %event.job_id, "Event for untracked job ignored");
            return EventOutcome::Untracked;
        };

        if record.state.is_terminal() {
            tracing::debug!(
                job_id = %event.job_id,
                state = ?record.state,
                "Event for terminal job ignored",
            );
            return EventOutcome::AlreadyTerminal;
        }

        let next = LifecycleState::from_status(&event.status);
        record.state = next;
        if event.message.is_some() {
            record.last_message = event.message.clone();
        }

        if next.is_terminal() {
            record.terminal_at = Some(Instant::now());
            // First terminal event for this job: the pending entry exists
            // by the registry/tracker invariant.
            tracker.resolve(&event.job_id, next);
            return EventOutcome::Finished {
                item: record.item.clone(),
                state: next,
            };
        }

        EventOutcome::Progressed {
            item: record.item.clone(),
        }
    }

    /// Evict terminal records whose retention window has elapsed.
    ///
    /// Returns the number of records removed. Counters in any tracker are
    /// unaffected.
    pub fn sweep_expired(&mut self, now: Instant, retention: Duration) -> usize {
        let before = self.jobs.len();
        self.jobs.retain(|_, record| match record.terminal_at {
            Some(at) => now.duration_since(at) < retention,
            None => true,
        });
        let evicted = before - self.jobs.len();
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted expired terminal jobs");
        }
        evicted
    }
}
