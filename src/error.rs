use std::time::Duration;

/// Errors surfaced by the stream client.
///
/// Only [`StreamError::MissingToken`] and [`StreamError::InvalidUrl`] are
/// returned synchronously from `start()`. The rest feed the reconnect loop
/// internally and show up in diagnostics rather than as return values.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// `start()` was called without an auth token configured. Callers must
    /// re-authenticate before retrying; the client never retries this itself.
    #[error("no auth token configured; save credentials before connecting")]
    MissingToken,

    #[error("invalid stream endpoint: {0}")]
    InvalidUrl(String),

    #[error("stream connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// Failed to establish the WebSocket connection.
    #[error("stream connection failed: {0}")]
    Connection(String),

    #[error("stream closed by server")]
    ClosedByServer,

    /// A read or write error on an established connection.
    #[error("stream transport error: {0}")]
    Transport(String),
}
