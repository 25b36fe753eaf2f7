//! Batch manager: submission coordination and stream supervision.
//!
//! [`BatchManager`] owns the session state (job registry + batch
//! tracker), the submission API client, and the long-lived stream task
//! (connect -> process -> reconnect). Presentation-facing events are
//! broadcast via [`BatchManager::subscribe`]; the aggregate is exposed as
//! an explicit handle rather than any ambient global.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;

use pegasus_core::{compute_aggregate, Aggregate, BatchTracker, WorkItem};

use crate::api::SubmissionApi;
use crate::client::{StreamClient, StreamClientError};
use crate::events::ClientEvent;
use crate::processor::process_messages;
use crate::reconnect::{reconnect_loop, ReconnectConfig};
use crate::registry::{JobRegistry, TERMINAL_RETENTION};

/// Broadcast channel capacity for client events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How often the sweeper checks for expired terminal records.
const SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Configuration for a batch manager session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base HTTP URL of the Pegasus server, e.g. `http://host:3000`.
    pub base_url: String,
}

/// Summary returned by [`BatchManager::submit_batch`] once every item
/// has been dispatched. Asynchronous completion continues to be tracked
/// by the registry independently of this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub dispatched: usize,
    pub immediate_failures: usize,
}

/// Errors from batch submission.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The batch contained no work items; no network call was made.
    #[error("A batch must contain at least one work item")]
    EmptyBatch,
}

/// Registry and tracker for the active batch, guarded by one mutex so
/// every register/apply runs to completion before the next touches it.
pub(crate) struct SessionState {
    pub(crate) registry: JobRegistry,
    pub(crate) tracker: BatchTracker,
}

/// Orchestrates batch submission and progress reconciliation for one
/// Pegasus server.
///
/// Created via [`BatchManager::start`]; the returned `Arc` can be
/// cheaply cloned into rendering tasks.
pub struct BatchManager {
    api: SubmissionApi,
    stream_client: Arc<StreamClient>,
    state: Arc<Mutex<SessionState>>,
    event_tx: broadcast::Sender<ClientEvent>,
    /// Master cancellation token -- cancelled during shutdown.
    cancel: CancellationToken,
    tasks: Mutex<SessionTasks>,
}

#[derive(Default)]
struct SessionTasks {
    stream: Option<tokio::task::JoinHandle<()>>,
    sweeper: Option<tokio::task::JoinHandle<()>>,
}

impl BatchManager {
    /// Create a manager for the given server.
    ///
    /// Validates the base URL (the stream URL is derived from it) but
    /// does not connect; call [`connect`](Self::connect) to establish
    /// the progress subscription.
    pub fn start(config: ClientConfig) -> Result<Arc<Self>, StreamClientError> {
        let stream_client = Arc::new(StreamClient::new(&config.base_url)?);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Arc::new(Self {
            api: SubmissionApi::new(config.base_url),
            stream_client,
            state: Arc::new(Mutex::new(SessionState {
                registry: JobRegistry::new(),
                tracker: BatchTracker::new(0),
            })),
            event_tx,
            cancel: CancellationToken::new(),
            tasks: Mutex::new(SessionTasks::default()),
        }))
    }

    /// Subscribe to presentation-facing client events.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.event_tx.subscribe()
    }

    /// Establish the progress-stream subscription.
    ///
    /// Idempotent: calling while the stream task is already live spawns
    /// nothing. The task runs connect -> process -> reconnect until
    /// [`shutdown`](Self::shutdown).
    pub async fn connect(&self) {
        let mut tasks = self.tasks.lock().await;

        if matches!(&tasks.stream, Some(handle) if !handle.is_finished()) {
            tracing::debug!("Stream task already running; connect is a no-op");
            return;
        }

        let client = Arc::clone(&self.stream_client);
        let state = Arc::clone(&self.state);
        let event_tx = self.event_tx.clone();
        let cancel = self.cancel.child_token();
        tasks.stream = Some(tokio::spawn(async move {
            run_stream_loop(&client, &state, &event_tx, &cancel, &ReconnectConfig::default()).await;
            tracing::info!("Stream task exited");
        }));

        if !matches!(&tasks.sweeper, Some(handle) if !handle.is_finished()) {
            let state = Arc::clone(&self.state);
            let cancel = self.cancel.child_token();
            tasks.sweeper = Some(tokio::spawn(async move {
                run_sweeper(&state, &cancel).await;
            }));
        }
    }

    /// Submit a batch of work items sequentially, in input order.
    ///
    /// Each accepted item is registered under its service-assigned
    /// `job_id`; each rejected item is counted as an immediate failure
    /// and reported with its error detail. Submissions are deliberately
    /// sequential — one outstanding request bounds the load on the
    /// service at the cost of a slow item stalling the rest of the
    /// batch.
    pub async fn submit_batch(
        &self,
        items: Vec<WorkItem>,
        destination: &str,
        options: &[String],
    ) -> Result<BatchSummary, SubmitError> {
        if items.is_empty() {
            return Err(SubmitError::EmptyBatch);
        }

        let total = items.len();
        {
            // A new batch replaces the previous session state entirely;
            // stale events for old jobs fall into the untracked path.
            let mut session = self.state.lock().await;
            session.registry.clear();
            session.tracker = BatchTracker::new(total);
        }

        tracing::info!(total, destination, "Submitting batch");

        let mut dispatched = 0usize;
        let mut immediate_failures = 0usize;

        for (i, item) in items.into_iter().enumerate() {
            let index = i + 1;
            match self.api.submit(&item.source, destination, options).await {
                Ok(response) => {
                    let mut session = self.state.lock().await;
                    let SessionState { registry, tracker } = &mut *session;
                    registry.register(tracker, &response.job_id, item.clone());
                    dispatched += 1;

                    tracing::info!(
                        index,
                        total,
                        job_id = %response.job_id,
                        source = %item.source,
                        "Item dispatched",
                    );
                    let _ = self.event_tx.send(ClientEvent::ItemDispatched {
                        index,
                        total,
                        source: item.source,
                        job_id: response.job_id,
                    });
                }
                Err(e) => {
                    let mut session = self.state.lock().await;
                    session.tracker.record_immediate_failure();
                    immediate_failures += 1;

                    tracing::warn!(index, total, source = %item.source, error = %e, "Item rejected");
                    let _ = self.event_tx.send(ClientEvent::ItemRejected {
                        index,
                        total,
                        source: item.source,
                        detail: e.to_string(),
                    });
                    let _ = self.event_tx.send(ClientEvent::AggregateUpdated(
                        compute_aggregate(&session.tracker),
                    ));
                }
            }
        }

        let _ = self
            .event_tx
            .send(ClientEvent::AggregateUpdated(self.aggregate().await));

        Ok(BatchSummary {
            total,
            dispatched,
            immediate_failures,
        })
    }

    /// Current aggregate progress signal for the active batch.
    pub async fn aggregate(&self) -> Aggregate {
        compute_aggregate(&self.state.lock().await.tracker)
    }

    /// Whether every item of the active batch has a terminal outcome.
    pub async fn is_exhausted(&self) -> bool {
        self.state.lock().await.tracker.is_exhausted()
    }

    /// Gracefully stop the stream and sweeper tasks.
    ///
    /// Cancels the master token, then waits up to 5 seconds per task for
    /// a clean exit.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down batch manager");
        self.cancel.cancel();

        let mut tasks = self.tasks.lock().await;
        for handle in [tasks.stream.take(), tasks.sweeper.take()].into_iter().flatten() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }

        tracing::info!("Batch manager shut down complete");
    }
}

/// Supervised stream loop: connect -> process -> reconnect.
///
/// Runs until the cancellation token is triggered. Registered pending
/// jobs live in the session state outside this loop, so a disconnect
/// loses no tracking — events simply resume after reconnection.
async fn run_stream_loop(
    client: &StreamClient,
    state: &Mutex<SessionState>,
    event_tx: &broadcast::Sender<ClientEvent>,
    cancel: &CancellationToken,
    reconnect_config: &ReconnectConfig,
) {
    let mut conn = match client.connect().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!(error = %e, "Initial stream connection failed, entering reconnect loop");
            match reconnect_loop(client, reconnect_config, cancel).await {
                Some(conn) => conn,
                None => return, // cancelled
            }
        }
    };

    loop {
        let _ = event_tx.send(ClientEvent::StreamConnected);

        process_messages(&mut conn.ws_stream, state, event_tx).await;

        let _ = event_tx.send(ClientEvent::StreamDisconnected);
        if cancel.is_cancelled() {
            return;
        }

        tracing::info!("Progress stream lost, entering reconnect loop");
        conn = match reconnect_loop(client, reconnect_config, cancel).await {
            Some(conn) => conn,
            None => return, // cancelled
        };
    }
}

/// Periodic eviction of expired terminal records.
async fn run_sweeper(state: &Mutex<SessionState>, cancel: &CancellationToken) {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = interval.tick() => {
                let mut session = state.lock().await;
                session.registry.sweep_expired(Instant::now(), TERMINAL_RETENTION);
            }
        }
    }
}
