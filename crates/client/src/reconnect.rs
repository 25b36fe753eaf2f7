//! Fixed-delay reconnection for the progress stream.
//!
//! When the stream drops, the supervising task calls [`reconnect_loop`]
//! to keep retrying until the connection is restored or the
//! [`CancellationToken`] is triggered. The delay is fixed rather than
//! backed off: the client cannot distinguish a transient blip from a
//! long outage, so it simply keeps trying for the lifetime of the
//! session.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::client::{StreamClient, StreamConnection};

/// Delay between reconnection attempts. Contract value: 3000 ms.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Tunable reconnection parameters.
pub struct ReconnectConfig {
    /// Fixed delay before each reconnection attempt.
    pub delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay: RECONNECT_DELAY,
        }
    }
}

/// Retry the stream connection until it succeeds or `cancel` fires.
///
/// Each attempt is preceded by the fixed delay, and the cancellation
/// token is checked before every scheduled retry. There is no maximum
/// attempt count. Returns `None` only on cancellation.
pub async fn reconnect_loop(
    client: &StreamClient,
    config: &ReconnectConfig,
    cancel: &CancellationToken,
) -> Option<StreamConnection> {
    let mut attempt = 0u32;

    loop {
        // Wait out the fixed delay, respecting cancellation.
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Reconnect cancelled");
                return None;
            }
            _ = tokio::time::sleep(config.delay) => {}
        }

        attempt += 1;
        tracing::info!(
            attempt,
            delay_ms = config.delay.as_millis() as u64,
            "Reconnecting to progress stream",
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Reconnect cancelled");
                return None;
            }
            result = client.connect() => {
                match result {
                    Ok(conn) => {
                        tracing::info!(attempt, "Reconnected to progress stream");
                        return Some(conn);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Reconnect attempt {attempt} failed");
                    }
                }
            }
        }
    }
}
