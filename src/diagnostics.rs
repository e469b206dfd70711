use serde::Serialize;

use crate::{
    core::{unix_now_secs, NotifyCore},
    model::ConnectionState,
};

/// Point-in-time snapshot of stream health for the passive status indicator.
#[derive(Debug, Serialize, Clone)]
pub struct RuntimeDiagnostics {
    pub connection_state: ConnectionState,
    pub should_run: bool,
    pub last_connected_at: Option<u64>,
    pub last_event_at: Option<u64>,
    pub stale_for_seconds: Option<u64>,
    pub last_error: Option<String>,
    pub reconnect_attempts: u32,
    pub unread: u64,
    pub tracked_jobs: usize,
}

pub fn snapshot_runtime(core: &NotifyCore) -> RuntimeDiagnostics {
    let tracked_jobs = core.progress_snapshot().len();
    let runtime = core.runtime();
    let now = unix_now_secs();
    let stale_for_seconds = runtime.last_event_at.map(|last| now.saturating_sub(last));

    RuntimeDiagnostics {
        connection_state: runtime.connection_state,
        should_run: runtime.should_run,
        last_connected_at: runtime.last_connected_at,
        last_event_at: runtime.last_event_at,
        stale_for_seconds,
        last_error: runtime.last_error.clone(),
        reconnect_attempts: runtime.reconnect_attempts,
        unread: runtime.unread,
        tracked_jobs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::PreferenceStore;

    #[test]
    fn snapshot_reflects_idle_core() {
        let core = NotifyCore::new(PreferenceStore::in_memory());
        let diag = snapshot_runtime(&core);

        assert_eq!(diag.connection_state, ConnectionState::Disconnected);
        assert!(!diag.should_run);
        assert!(diag.last_connected_at.is_none());
        assert_eq!(diag.unread, 0);
        assert_eq!(diag.tracked_jobs, 0);
    }

    #[test]
    fn snapshot_counts_unread_and_jobs() {
        let core = NotifyCore::new(PreferenceStore::in_memory());
        core.increment_unread();
        core.mark_stream_activity(unix_now_secs());

        let diag = snapshot_runtime(&core);
        assert_eq!(diag.unread, 1);
        assert!(diag.stale_for_seconds.is_some());
    }
}
