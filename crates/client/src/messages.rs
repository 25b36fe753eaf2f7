//! Progress-stream payload types and classification.
//!
//! The stream delivers either a one-time plaintext welcome (identified by
//! a fixed prefix) or JSON-encoded per-job progress events. This module
//! classifies raw text frames into a typed [`StreamPayload`].

use serde::Deserialize;

/// Fixed prefix of the one-time welcome frame sent after connecting.
pub const WELCOME_PREFIX: &str = "Connected to";

/// A structured per-job lifecycle event from the stream.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressEvent {
    /// Service-assigned job identifier (snake_case on the wire).
    pub job_id: String,
    /// Raw status string, e.g. `downloading`, `completed`, `error`.
    pub status: String,
    /// Fractional or percentage progress, when the service reports one.
    #[serde(default)]
    pub progress: Option<f64>,
    /// Human-readable detail accompanying the status.
    #[serde(default)]
    pub message: Option<String>,
    /// The source URL the job is processing, when echoed back.
    #[serde(default)]
    pub url: Option<String>,
}

/// One classified text frame from the stream.
#[derive(Debug, Clone)]
pub enum StreamPayload {
    /// The handshake greeting. Logged and discarded by the processor.
    Welcome(String),
    /// A structured lifecycle event to forward to the registry.
    Event(ProgressEvent),
}

/// Classify a raw text frame.
///
/// Returns `Err` for frames that are neither the welcome greeting nor
/// valid event JSON. Callers must log and drop those — a malformed frame
/// never stops future delivery.
pub fn classify_payload(text: &str) -> Result<StreamPayload, serde_json::Error> {
    if text.starts_with(WELCOME_PREFIX) {
        return Ok(StreamPayload::Welcome(text.to_string()));
    }
    serde_json::from_str::<ProgressEvent>(text).map(StreamPayload::Event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn welcome_frame_is_classified_by_prefix() {
        let payload = classify_payload("Connected to Pegasus download progress feed").unwrap();
        assert_matches!(payload, StreamPayload::Welcome(text) => {
            assert!(text.contains("progress feed"));
        });
    }

    #[test]
    fn full_event_parses() {
        let json = r#"{"job_id":"j1","url":"https://a.example/v","status":"downloading","progress":0.4,"message":"Fetching"}"#;
        let payload = classify_payload(json).unwrap();
        assert_matches!(payload, StreamPayload::Event(ev) => {
            assert_eq!(ev.job_id, "j1");
            assert_eq!(ev.status, "downloading");
            assert_eq!(ev.progress, Some(0.4));
            assert_eq!(ev.message.as_deref(), Some("Fetching"));
            assert_eq!(ev.url.as_deref(), Some("https://a.example/v"));
        });
    }

    #[test]
    fn minimal_event_parses_with_defaults() {
        let payload = classify_payload(r#"{"job_id":"j2","status":"completed"}"#).unwrap();
        assert_matches!(payload, StreamPayload::Event(ev) => {
            assert_eq!(ev.job_id, "j2");
            assert!(ev.progress.is_none());
            assert!(ev.message.is_none());
        });
    }

    #[test]
    fn malformed_json_returns_error() {
        assert!(classify_payload("not json at all").is_err());
        assert!(classify_payload("{\"status\":\"completed\"}").is_err()); // missing job_id
    }
}
