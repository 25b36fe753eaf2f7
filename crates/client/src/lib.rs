//! Batch submission and progress-reconciliation engine for the Pegasus
//! media processing service.
//!
//! Provides the HTTP submission client, the WebSocket progress stream
//! (with fixed-delay reconnection), the job registry that correlates
//! stream events back to submitted work items, and the [`BatchManager`]
//! that ties them together behind a broadcast of [`ClientEvent`]s.

pub mod api;
pub mod client;
pub mod events;
pub mod manager;
pub mod messages;
pub mod processor;
pub mod reconnect;
pub mod registry;

pub use api::{SubmissionApi, SubmissionApiError, SubmitResponse};
pub use client::{StreamClient, StreamClientError};
pub use events::ClientEvent;
pub use manager::{BatchManager, BatchSummary, ClientConfig, SubmitError};
pub use messages::{ProgressEvent, StreamPayload};
pub use registry::JobRegistry;
