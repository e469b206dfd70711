//! Realtime notification delivery core for the VOD admin console.
//!
//! Owns the persistent WebSocket stream to the backend and decides whether,
//! when, and how each pushed event reaches the operator: transcode progress
//! flows into a live per-job tracker, admin alerts run through preference,
//! quiet-hours, and dedup gates before any sound, desktop notification, or
//! toast is raised.
//!
//! The presentation layer consumes exactly two things: the typed
//! [`UiEvent`](model::UiEvent) stream from [`NotifyCore::subscribe`] and
//! [`NotifyCore::mark_as_read`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use vod_notify::{NotifyClient, NotifyCore, PreferenceStore, StreamConfig};
//!
//! # async fn example() -> Result<(), vod_notify::StreamError> {
//! let core = Arc::new(NotifyCore::new(PreferenceStore::in_memory()));
//! let mut events = core.subscribe();
//!
//! let client = NotifyClient::new(
//!     Arc::clone(&core),
//!     StreamConfig {
//!         base_url: "https://panel.example.com".into(),
//!         token: Some("secret".into()),
//!         ..StreamConfig::default()
//!     },
//! );
//! client.start()?;
//!
//! while let Ok(event) = events.recv().await {
//!     // render toasts, badges, progress bars...
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod consts;
mod core;
mod dedup;
mod diagnostics;
mod dispatch;
mod error;
mod model;
mod preferences;
mod progress;
mod router;
mod stream;

pub use crate::core::NotifyCore;
pub use config::StreamConfig;
pub use dedup::DedupCache;
pub use diagnostics::{snapshot_runtime, RuntimeDiagnostics};
pub use error::StreamError;
pub use model::{
    AdminNotification, ConnectionState, Severity, StreamMessage, SystemMessage, Toast,
    ToastPosition, TranscodeComplete, TranscodeFailed, TranscodeProgress, UiEvent,
};
pub use preferences::{
    PreferenceStore, Preferences, PreferencesUpdate, QuietHours, QuietHoursUpdate,
};
pub use progress::ProgressTracker;
pub use stream::NotifyClient;
