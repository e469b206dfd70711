//! Wire-level inbound events and the typed outbound stream consumed by the
//! presentation layer.
//!
//! The server sends JSON frames shaped `{"type": "<kind>", ...}` with the
//! payload fields inlined next to the tag. [`StreamMessage`] deserializes
//! them via the internally-tagged `type` field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of the single duplex connection. Owned by the stream task;
/// everything else only observes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Closing,
}

/// Ordinal importance of an admin notification: info < warning < error < critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
    ];
}

/// All known inbound frame types.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    /// Periodic progress update for a running transcode job.
    TranscodeProgress(TranscodeProgress),

    /// A transcode job finished successfully.
    TranscodeComplete(TranscodeComplete),

    /// A transcode job failed.
    TranscodeFailed(TranscodeFailed),

    /// An operator-facing alert pushed by the backend.
    AdminNotification(AdminNotification),

    /// Free-form status text for the status bar.
    SystemMessage(SystemMessage),

    /// Handshake acknowledgement; carries no payload.
    Connected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeProgress {
    pub job_id: i64,
    pub status: String,
    /// Percentage 0..=100; over-range wire values are clamped to 100.
    #[serde(deserialize_with = "clamp_percentage")]
    pub progress: u8,
    #[serde(default)]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

fn clamp_percentage<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = u8::deserialize(deserializer)?;
    Ok(value.min(100))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeComplete {
    pub job_id: i64,
    pub title: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub size_bytes: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeFailed {
    pub job_id: i64,
    pub title: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminNotification {
    pub notification_id: i64,
    pub notification_type: String,
    pub severity: Severity,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub link: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMessage {
    pub message: String,
    #[serde(default)]
    pub level: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Screen corner toasts are anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToastPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// A request to show an on-screen toast. `duration_ms == 0` means sticky:
/// the toast stays until the operator dismisses it.
#[derive(Debug, Clone, Serialize)]
pub struct Toast {
    pub kind: String,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub duration_ms: u64,
    pub position: ToastPosition,
}

/// The typed event stream handed to the presentation layer.
///
/// Delivered over a broadcast channel; side-effect variants (`Sound`,
/// `Vibrate`, `DeviceNotification`) are triggers, not state — the UI shell
/// executes them and keeps no copy.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UiEvent {
    ConnectionChanged(ConnectionState),

    /// A session ended with an error; the client is about to retry (or has
    /// given up, in which case [`UiEvent::ConnectionLost`] follows). Status
    /// indicator material, not an interrupting error.
    ConnectionError(String),

    /// Reconnect budget exhausted; a manual refresh is required.
    /// Published exactly once per exhausted stream session.
    ConnectionLost,

    Toast(Toast),
    Sound,
    Vibrate,
    DeviceNotification {
        title: String,
        body: String,
        severity: Severity,
    },

    UnreadChanged(u64),
    ProgressUpdated(TranscodeProgress),
    ProgressCleared {
        job_id: i64,
    },
    SystemMessage(SystemMessage),

    /// Server handshake ack observed on the wire.
    HandshakeAcked,
}
