//! Client events produced for the presentation layer.
//!
//! These are the only contract the rendering side consumes: per-item
//! status lines, per-job lifecycle outcomes, stream health, and the
//! recomputed aggregate. They are fanned out via a
//! [`tokio::sync::broadcast`] channel owned by the manager.

use serde::Serialize;

use pegasus_core::Aggregate;

/// A presentation-facing event from the batch engine.
#[derive(Debug, Clone, Serialize)]
pub enum ClientEvent {
    /// The progress stream subscription was established.
    StreamConnected,

    /// The progress stream dropped; reconnection is underway.
    StreamDisconnected,

    /// One item was accepted by the submission endpoint.
    ItemDispatched {
        /// 1-based position within the batch.
        index: usize,
        total: usize,
        source: String,
        job_id: String,
    },

    /// One item was rejected at submission time (no job was created).
    ItemRejected {
        index: usize,
        total: usize,
        source: String,
        detail: String,
    },

    /// A tracked job reported non-terminal progress.
    JobProgressed {
        job_id: String,
        source: String,
        progress: Option<f64>,
        message: Option<String>,
    },

    /// A tracked job completed successfully.
    JobCompleted { job_id: String, source: String },

    /// A tracked job failed.
    JobFailed {
        job_id: String,
        source: String,
        detail: Option<String>,
    },

    /// The aggregate progress signal changed.
    AggregateUpdated(Aggregate),
}
