//! WebSocket client for the Pegasus progress stream.
//!
//! [`StreamClient`] derives the stream URL from the server's HTTP base
//! URL (same origin, scheme-mapped, path `/ws`). Call
//! [`StreamClient::connect`] to establish a live [`StreamConnection`].

use tokio_tungstenite::{connect_async, MaybeTlsStream};
use url::Url;

/// Configuration handle for the Pegasus progress stream.
#[derive(Debug)]
pub struct StreamClient {
    ws_url: String,
}

/// A live WebSocket connection to the progress stream.
pub struct StreamConnection {
    /// The raw WebSocket stream for reading frames.
    pub ws_stream: tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

/// Errors that can occur when working with the stream client.
#[derive(Debug, thiserror::Error)]
pub enum StreamClientError {
    /// The HTTP base URL could not be parsed or scheme-mapped.
    #[error("Invalid server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Failed to establish the WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),
}

impl StreamClient {
    /// Create a stream client from the server's HTTP base URL.
    ///
    /// `https` maps to `wss`, `http` to `ws`; the path is always `/ws`.
    pub fn new(base_url: &str) -> Result<Self, StreamClientError> {
        let mut url = Url::parse(base_url).map_err(|e| StreamClientError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(StreamClientError::InvalidUrl {
                    url: base_url.to_string(),
                    reason: format!("unsupported scheme '{other}'"),
                })
            }
        };
        // set_scheme only rejects invalid transitions, which the match above rules out.
        url.set_scheme(scheme)
            .map_err(|_| StreamClientError::InvalidUrl {
                url: base_url.to_string(),
                reason: "scheme mapping failed".to_string(),
            })?;
        url.set_path("/ws");
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self {
            ws_url: url.to_string(),
        })
    }

    /// The derived WebSocket URL (e.g. `ws://host:3000/ws`).
    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Connect to the progress stream endpoint.
    pub async fn connect(&self) -> Result<StreamConnection, StreamClientError> {
        let (ws_stream, _response) = connect_async(&self.ws_url).await.map_err(|e| {
            StreamClientError::Connection(format!(
                "Failed to connect to progress stream at {}: {e}",
                self.ws_url
            ))
        })?;

        tracing::info!(ws_url = %self.ws_url, "Connected to progress stream");

        Ok(StreamConnection { ws_stream })
    }
}
