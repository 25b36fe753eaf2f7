//! Pure progress aggregation over a [`BatchTracker`].
//!
//! [`compute_aggregate`] derives the single progress signal the
//! presentation layer renders. It holds no state and is safe to call on
//! every update.

use serde::Serialize;

use crate::types::BatchTracker;

/// Coarse status classification for a whole batch.
///
/// `Failure` is sticky: any failed item ever observed marks the batch,
/// because partial failure must not look like full success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classification {
    /// No batch in flight (idle tracker).
    Pending,
    /// Jobs outstanding, nothing failed so far.
    Processing,
    /// Every item completed successfully.
    Success,
    /// At least one item failed (at submission or later).
    Failure,
}

/// The aggregate progress signal: a 0..=100 percentage plus classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    pub percent: u8,
    pub classification: Classification,
}

/// Compute the aggregate signal from the tracker's current counts.
///
/// `percent` is driven by successful completions only — failures never
/// push the bar towards 100, so a batch with failures cannot visually
/// reach full success. Because `completed` is monotonic and `total` is
/// fixed for the lifetime of a batch, the percentage never decreases.
pub fn compute_aggregate(tracker: &BatchTracker) -> Aggregate {
    if tracker.total() == 0 {
        return Aggregate {
            percent: 0,
            classification: Classification::Pending,
        };
    }

    let percent = ((tracker.completed() as f64 / tracker.total() as f64) * 100.0).round() as u8;

    let classification = if tracker.failed() > 0 {
        Classification::Failure
    } else if percent == 100 {
        Classification::Success
    } else {
        Classification::Processing
    };

    Aggregate {
        percent,
        classification,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LifecycleState, WorkItem};

    fn tracker_with(total: usize, completed: usize, failed: usize) -> BatchTracker {
        let mut tracker = BatchTracker::new(total);
        for i in 0..completed {
            let id = format!("c{i}");
            tracker.track(id.clone(), WorkItem::new("u"));
            tracker.resolve(&id, LifecycleState::Completed);
        }
        for _ in 0..failed {
            tracker.record_immediate_failure();
        }
        tracker
    }

    #[test]
    fn idle_tracker_is_pending() {
        let agg = compute_aggregate(&BatchTracker::new(0));
        assert_eq!(agg.percent, 0);
        assert_eq!(agg.classification, Classification::Pending);
    }

    #[test]
    fn all_completed_is_success() {
        let agg = compute_aggregate(&tracker_with(3, 3, 0));
        assert_eq!(agg.percent, 100);
        assert_eq!(agg.classification, Classification::Success);
    }

    #[test]
    fn partial_completion_is_processing() {
        let agg = compute_aggregate(&tracker_with(4, 1, 0));
        assert_eq!(agg.percent, 25);
        assert_eq!(agg.classification, Classification::Processing);
    }

    #[test]
    fn any_failure_is_sticky() {
        // One failure, rest completed: percent below 100, classified Failure.
        let agg = compute_aggregate(&tracker_with(2, 1, 1));
        assert_eq!(agg.percent, 50);
        assert_eq!(agg.classification, Classification::Failure);
    }

    #[test]
    fn failures_never_reach_visual_success() {
        let agg = compute_aggregate(&tracker_with(3, 2, 1));
        assert!(agg.percent < 100);
        assert_eq!(agg.classification, Classification::Failure);
    }

    #[test]
    fn percent_rounds_to_nearest() {
        let agg = compute_aggregate(&tracker_with(3, 1, 0));
        assert_eq!(agg.percent, 33);
        let agg = compute_aggregate(&tracker_with(3, 2, 0));
        assert_eq!(agg.percent, 67);
    }

    #[test]
    fn percent_is_monotonic_over_completions() {
        let mut tracker = BatchTracker::new(5);
        for i in 0..5 {
            tracker.track(format!("j{i}"), WorkItem::new("u"));
        }
        let mut last = compute_aggregate(&tracker).percent;
        for i in 0..5 {
            tracker.resolve(&format!("j{i}"), LifecycleState::Completed);
            let now = compute_aggregate(&tracker).percent;
            assert!(now >= last);
            last = now;
        }
        assert_eq!(last, 100);
    }
}
