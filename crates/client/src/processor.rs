//! Progress-stream frame processing loop.
//!
//! Reads raw frames from a live stream connection, classifies them via
//! [`classify_payload`], applies structured events to the session's
//! registry, and emits [`ClientEvent`]s. The processor interprets no
//! event semantics itself beyond the registry outcome — malformed frames
//! are logged and dropped, never fatal.

use futures::StreamExt;
use tokio::sync::{broadcast, Mutex};
use tokio_tungstenite::tungstenite::Message;

use pegasus_core::{compute_aggregate, LifecycleState};

use crate::events::ClientEvent;
use crate::manager::SessionState;
use crate::messages::{classify_payload, StreamPayload};
use crate::registry::EventOutcome;

/// Process frames from the stream until it closes or errors.
///
/// Each text frame is classified and handled; binary and ping/pong
/// frames are ignored. Returns when the connection drops, at which point
/// the supervising loop schedules a reconnect.
pub(crate) async fn process_messages(
    ws_stream: &mut tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    state: &Mutex<SessionState>,
    event_tx: &broadcast::Sender<ClientEvent>,
) {
    while let Some(msg_result) = ws_stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                handle_text_frame(&text, state, event_tx).await;
            }
            Ok(Message::Binary(_)) => {
                tracing::trace!("Ignoring binary frame");
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {
                // Handled automatically by tungstenite.
            }
            Ok(Message::Close(frame)) => {
                tracing::info!(?frame, "Progress stream closed");
                break;
            }
            Ok(Message::Frame(_)) => {}
            Err(e) => {
                tracing::error!(error = %e, "Progress stream receive error");
                break;
            }
        }
    }
}

/// Classify and apply a single text frame.
pub(crate) async fn handle_text_frame(
    text: &str,
    state: &Mutex<SessionState>,
    event_tx: &broadcast::Sender<ClientEvent>,
) {
    let event = match classify_payload(text) {
        Ok(StreamPayload::Welcome(greeting)) => {
            tracing::info!(%greeting, "Progress stream handshake");
            return;
        }
        Ok(StreamPayload::Event(event)) => event,
        Err(e) => {
            tracing::warn!(error = %e, raw_frame = %text, "Dropping malformed stream frame");
            return;
        }
    };

    let mut session = state.lock().await;
    let SessionState { registry, tracker } = &mut *session;

    match registry.apply_event(tracker, &event) {
        EventOutcome::Untracked | EventOutcome::AlreadyTerminal => {}
        EventOutcome::Progressed { item } => {
            let _ = event_tx.send(ClientEvent::JobProgressed {
                job_id: event.job_id.clone(),
                source: item.source,
                progress: event.progress,
                message: event.message.clone(),
            });
        }
        EventOutcome::Finished {
            item,
            state: final_state,
        } => {
            let outcome_event = match final_state {
                LifecycleState::Completed => ClientEvent::JobCompleted {
                    job_id: event.job_id.clone(),
                    source: item.source,
                },
                _ => ClientEvent::JobFailed {
                    job_id: event.job_id.clone(),
                    source: item.source,
                    detail: event.message.clone(),
                },
            };
            let _ = event_tx.send(outcome_event);
            let _ = event_tx.send(ClientEvent::AggregateUpdated(compute_aggregate(tracker)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pegasus_core::{BatchTracker, Classification, WorkItem};

    use crate::registry::JobRegistry;

    fn session_with(job_ids: &[&str]) -> Mutex<SessionState> {
        let mut registry = JobRegistry::new();
        let mut tracker = BatchTracker::new(job_ids.len());
        for id in job_ids {
            registry.register(&mut tracker, id, WorkItem::new(format!("https://e/{id}")));
        }
        Mutex::new(SessionState { registry, tracker })
    }

    fn drain(rx: &mut broadcast::Receiver<ClientEvent>) -> Vec<ClientEvent> {
        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        events
    }

    #[tokio::test]
    async fn all_jobs_completing_reaches_full_success() {
        let state = session_with(&["a", "b", "c"]);
        let (tx, mut rx) = broadcast::channel(64);

        for id in ["a", "b", "c"] {
            let frame = format!(r#"{{"job_id":"{id}","status":"completed"}}"#);
            handle_text_frame(&frame, &state, &tx).await;
        }

        let session = state.lock().await;
        assert!(session.tracker.is_exhausted());
        let agg = compute_aggregate(&session.tracker);
        assert_eq!(agg.percent, 100);
        assert_eq!(agg.classification, Classification::Success);

        let events = drain(&mut rx);
        let completions = events
            .iter()
            .filter(|e| matches!(e, ClientEvent::JobCompleted { .. }))
            .count();
        assert_eq!(completions, 3);
        assert_matches!(
            events.last(),
            Some(ClientEvent::AggregateUpdated(agg)) => {
                assert_eq!(agg.percent, 100);
            }
        );
    }

    #[tokio::test]
    async fn welcome_and_malformed_frames_leave_state_untouched() {
        let state = session_with(&["a"]);
        let (tx, mut rx) = broadcast::channel(16);

        handle_text_frame("Connected to Pegasus download progress feed", &state, &tx).await;
        handle_text_frame("{{{ definitely not json", &state, &tx).await;
        handle_text_frame(r#"{"status":"completed"}"#, &state, &tx).await;

        let session = state.lock().await;
        assert_eq!(session.tracker.completed(), 0);
        assert_eq!(session.tracker.pending_len(), 1);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn failure_event_carries_detail_and_marks_aggregate() {
        let state = session_with(&["a"]);
        let (tx, mut rx) = broadcast::channel(16);

        handle_text_frame(
            r#"{"job_id":"a","status":"error","message":"fetch failed"}"#,
            &state,
            &tx,
        )
        .await;

        let events = drain(&mut rx);
        assert_matches!(
            &events[0],
            ClientEvent::JobFailed { detail, .. } => {
                assert_eq!(detail.as_deref(), Some("fetch failed"));
            }
        );
        assert_matches!(
            &events[1],
            ClientEvent::AggregateUpdated(agg) => {
                assert_eq!(agg.classification, Classification::Failure);
            }
        );
    }

    #[tokio::test]
    async fn duplicate_terminal_frame_emits_nothing_further() {
        let state = session_with(&["a"]);
        let (tx, mut rx) = broadcast::channel(16);

        let frame = r#"{"job_id":"a","status":"completed"}"#;
        handle_text_frame(frame, &state, &tx).await;
        drain(&mut rx);

        handle_text_frame(frame, &state, &tx).await;
        assert!(drain(&mut rx).is_empty());
        assert_eq!(state.lock().await.tracker.completed(), 1);
    }

    #[tokio::test]
    async fn untracked_job_frame_is_silently_ignored() {
        let state = session_with(&["a"]);
        let (tx, mut rx) = broadcast::channel(16);

        handle_text_frame(r#"{"job_id":"ghost","status":"completed"}"#, &state, &tx).await;

        assert!(drain(&mut rx).is_empty());
        let session = state.lock().await;
        assert_eq!(session.tracker.completed(), 0);
        assert_eq!(session.registry.len(), 1);
    }

    #[tokio::test]
    async fn progress_frame_forwards_progress_value() {
        let state = session_with(&["a"]);
        let (tx, mut rx) = broadcast::channel(16);

        handle_text_frame(
            r#"{"job_id":"a","status":"downloading","progress":0.25}"#,
            &state,
            &tx,
        )
        .await;

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert_matches!(
            &events[0],
            ClientEvent::JobProgressed { progress, .. } => {
                assert_eq!(*progress, Some(0.25));
            }
        );
    }
}
