//! HTTP client for the Pegasus submission endpoint.
//!
//! Wraps `POST /api/submit` using [`reqwest`]. One call per work item;
//! the service answers with a `job_id` that the registry uses to
//! correlate later stream events.

use serde::{Deserialize, Serialize};

/// HTTP client for a single Pegasus server.
pub struct SubmissionApi {
    client: reqwest::Client,
    base_url: String,
}

/// Request body for the submission endpoint.
///
/// Field names are camelCase on the wire. `processing_options` order is
/// preserved verbatim — the service may interpret order-sensitive flags.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    media_url: &'a str,
    output_dir: &'a str,
    processing_options: &'a [String],
}

/// Response returned by the submission endpoint after accepting an item.
///
/// The canonical job-identifier field name is `job_id` (snake_case), as
/// the service serialises it.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Service-assigned identifier for the created job.
    pub job_id: String,
    /// Human-readable acknowledgement.
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body returned by the service on a non-2xx response.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Errors from the submission API layer.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Submission rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message from the service's error body, or the raw body text.
        message: String,
    },
}

impl SubmissionApi {
    /// Create a new API client for a Pegasus server.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `http://host:3000`.
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Submit a single work item for processing.
    ///
    /// Sends `POST /api/submit` with the source URL, destination
    /// directory, and the ordered processing options. Returns the
    /// service-assigned `job_id` on success.
    pub async fn submit(
        &self,
        media_url: &str,
        output_dir: &str,
        processing_options: &[String],
    ) -> Result<SubmitResponse, SubmissionApiError> {
        let body = SubmitRequest {
            media_url,
            output_dir,
            processing_options,
        };

        let response = self
            .client
            .post(format!("{}/api/submit", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            let message = serde_json::from_str::<ErrorBody>(&raw)
                .map(|b| b.message)
                .unwrap_or(raw);
            return Err(SubmissionApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<SubmitResponse>().await?)
    }
}
