//! Shared state hub for the notification core.
//!
//! One [`NotifyCore`] per session, shared as `Arc<NotifyCore>` between the
//! stream task and the embedding shell. Fan-out to the presentation layer
//! goes through a broadcast channel of [`UiEvent`]s; consumers that lag
//! simply observe a gap, the core never blocks on them.

use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::{SystemTime, UNIX_EPOCH},
};

use tokio::sync::{broadcast, watch};

use crate::{
    consts::UI_EVENT_CAPACITY,
    dedup::DedupCache,
    model::{ConnectionState, TranscodeProgress, UiEvent},
    preferences::PreferenceStore,
    progress::ProgressTracker,
};

pub(crate) struct RuntimeState {
    pub(crate) stop_tx: Option<watch::Sender<bool>>,
    /// Incremented every time a stream task is spawned. A task only writes
    /// cleanup state if its epoch still matches, so a late-exiting old task
    /// cannot clobber a freshly started replacement.
    pub(crate) stream_epoch: u64,
    pub(crate) connection_state: ConnectionState,
    pub(crate) should_run: bool,
    pub(crate) last_connected_at: Option<u64>,
    pub(crate) last_event_at: Option<u64>,
    pub(crate) last_error: Option<String>,
    pub(crate) reconnect_attempts: u32,
    pub(crate) unread: u64,
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self {
            stop_tx: None,
            stream_epoch: 0,
            connection_state: ConnectionState::Disconnected,
            should_run: false,
            last_connected_at: None,
            last_event_at: None,
            last_error: None,
            reconnect_attempts: 0,
            unread: 0,
        }
    }
}

pub struct NotifyCore {
    pub(crate) prefs: PreferenceStore,
    pub(crate) dedup: Mutex<DedupCache>,
    pub(crate) progress: Mutex<ProgressTracker>,
    pub(crate) runtime: Mutex<RuntimeState>,
    events: broadcast::Sender<UiEvent>,
}

impl NotifyCore {
    pub fn new(prefs: PreferenceStore) -> Self {
        let (events, _) = broadcast::channel(UI_EVENT_CAPACITY);
        Self {
            prefs,
            dedup: Mutex::new(DedupCache::default()),
            progress: Mutex::new(ProgressTracker::new()),
            runtime: Mutex::new(RuntimeState::default()),
            events,
        }
    }

    /// Subscribe to the typed event stream. Every subscriber independently
    /// receives every event published after the call.
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.prefs
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.runtime().connection_state
    }

    pub fn unread_count(&self) -> u64 {
        self.runtime().unread
    }

    /// Reset the local unread counter. Durable read-state lives behind the
    /// REST layer; this only clears what the badge shows.
    pub fn mark_as_read(&self) {
        self.runtime().unread = 0;
        self.publish(UiEvent::UnreadChanged(0));
    }

    pub fn progress_for(&self, job_id: i64) -> Option<TranscodeProgress> {
        self.lock_progress().get(job_id).cloned()
    }

    pub fn progress_snapshot(&self) -> Vec<TranscodeProgress> {
        self.lock_progress().snapshot()
    }

    /// Publish to all subscribers. A send error only means nobody is
    /// listening right now, which is fine.
    pub(crate) fn publish(&self, event: UiEvent) {
        let _ = self.events.send(event);
    }

    pub(crate) fn increment_unread(&self) {
        let unread = {
            let mut runtime = self.runtime();
            runtime.unread += 1;
            runtime.unread
        };
        self.publish(UiEvent::UnreadChanged(unread));
    }

    pub(crate) fn set_connection_state(&self, state: ConnectionState) {
        let changed = {
            let mut runtime = self.runtime();
            let changed = runtime.connection_state != state;
            runtime.connection_state = state;
            changed
        };
        if changed {
            self.publish(UiEvent::ConnectionChanged(state));
        }
    }

    pub(crate) fn mark_stream_activity(&self, at: u64) {
        self.runtime().last_event_at = Some(at);
    }

    pub(crate) fn runtime(&self) -> MutexGuard<'_, RuntimeState> {
        self.runtime.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn lock_dedup(&self) -> MutexGuard<'_, DedupCache> {
        self.dedup.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn lock_progress(&self) -> MutexGuard<'_, ProgressTracker> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub(crate) fn truncate_message(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }

    let truncated: String = input.chars().take(max_chars).collect();
    format!("{truncated}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_as_read_resets_unread_and_publishes() {
        let core = NotifyCore::new(PreferenceStore::in_memory());
        let mut rx = core.subscribe();

        core.increment_unread();
        core.increment_unread();
        assert_eq!(core.unread_count(), 2);

        core.mark_as_read();
        assert_eq!(core.unread_count(), 0);

        assert!(matches!(rx.try_recv(), Ok(UiEvent::UnreadChanged(1))));
        assert!(matches!(rx.try_recv(), Ok(UiEvent::UnreadChanged(2))));
        assert!(matches!(rx.try_recv(), Ok(UiEvent::UnreadChanged(0))));
    }

    #[test]
    fn connection_state_publishes_only_on_change() {
        let core = NotifyCore::new(PreferenceStore::in_memory());
        let mut rx = core.subscribe();

        core.set_connection_state(ConnectionState::Connecting);
        core.set_connection_state(ConnectionState::Connecting);
        core.set_connection_state(ConnectionState::Open);

        assert!(matches!(
            rx.try_recv(),
            Ok(UiEvent::ConnectionChanged(ConnectionState::Connecting))
        ));
        assert!(matches!(
            rx.try_recv(),
            Ok(UiEvent::ConnectionChanged(ConnectionState::Open))
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn truncate_message_bounds_long_payloads() {
        assert_eq!(truncate_message("short", 10), "short");
        assert_eq!(truncate_message("abcdefgh", 4), "abcd...");
    }
}
