//! Core sink trait and error type.

use std::time::Duration;

use thiserror::Error;

use crate::reading::Reading;

/// Errors that can occur while connecting to or writing into a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Write attempted without an established connection.
    #[error("sink not connected")]
    NotConnected,

    /// The sink could not be reached or reported itself unhealthy.
    #[error("connection failed: {0}")]
    Connection(String),

    /// HTTP transport error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store rejected the batch.
    #[error("write rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// I/O error on a stream-backed sink.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Batched persistence interface.
///
/// # Write Contract
///
/// - An empty batch is a successful no-op that never touches the transport.
/// - A batch succeeds or fails as one unit; partial acceptance by the store is
///   reported as a single [`SinkError`].
/// - Every failed write increments the counter returned by [`write_errors`].
///
/// Implementations are not required to support concurrent writes; the engine
/// never overlaps calls.
///
/// [`write_errors`]: BatchSink::write_errors
#[async_trait::async_trait]
pub trait BatchSink: Send + 'static {
    /// Establish the connection (single attempt).
    async fn connect(&mut self) -> Result<(), SinkError>;

    /// Close the connection. Idempotent.
    async fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Persist a batch of readings, consuming them.
    async fn write_batch(&mut self, readings: Vec<Reading>) -> Result<(), SinkError>;

    /// Number of failed writes since creation.
    fn write_errors(&self) -> u64;

    /// Retry [`connect`](BatchSink::connect) up to `max_retries` times with a
    /// fixed pause between failed attempts.
    ///
    /// Returns `true` as soon as one attempt succeeds. No pause follows the
    /// final attempt.
    async fn wait_for_connection(&mut self, max_retries: u32, retry_interval: Duration) -> bool {
        tracing::info!(max_retries, retry_interval = ?retry_interval, "Waiting for sink to be ready");

        for attempt in 1..=max_retries {
            match self.connect().await {
                Ok(()) => {
                    tracing::info!(attempt, "Sink connection established");
                    return true;
                }
                Err(e) => {
                    tracing::info!(
                        attempt,
                        max_retries,
                        error = %e,
                        "Sink connection attempt failed"
                    );
                    if attempt < max_retries {
                        tokio::time::sleep(retry_interval).await;
                    }
                }
            }
        }

        tracing::error!(max_retries, "Sink failed to become ready after maximum retries");
        false
    }
}
