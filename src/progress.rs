//! Latest-progress map for running transcode jobs.
//!
//! List screens read this instead of re-querying the backend. Entries are
//! removed on terminal events; a job that crashes without ever reporting
//! completion is the one case that leaks until the session ends.

use std::collections::HashMap;

use crate::model::TranscodeProgress;

#[derive(Default)]
pub struct ProgressTracker {
    jobs: HashMap<i64, TranscodeProgress>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest progress for a job. Returns false when the event is
    /// older than the entry already held, in which case nothing changes.
    pub fn upsert(&mut self, event: TranscodeProgress) -> bool {
        if let Some(current) = self.jobs.get(&event.job_id) {
            if event.timestamp < current.timestamp {
                tracing::debug!(job_id = event.job_id, "ignoring stale progress event");
                return false;
            }
        }
        self.jobs.insert(event.job_id, event);
        true
    }

    /// Clear a job on its terminal event. Returns the entry that was live,
    /// if any — callers use this to tell a fresh completion from a replay.
    pub fn remove(&mut self, job_id: i64) -> Option<TranscodeProgress> {
        self.jobs.remove(&job_id)
    }

    pub fn get(&self, job_id: i64) -> Option<&TranscodeProgress> {
        self.jobs.get(&job_id)
    }

    pub fn snapshot(&self) -> Vec<TranscodeProgress> {
        self.jobs.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn progress(job_id: i64, pct: u8, ts_offset: i64) -> TranscodeProgress {
        TranscodeProgress {
            job_id,
            status: "encoding".to_string(),
            progress: pct,
            message: None,
            timestamp: DateTime::<Utc>::from_timestamp(1_700_000_000 + ts_offset, 0).unwrap(),
        }
    }

    #[test]
    fn upsert_then_remove_leaves_no_entry() {
        let mut tracker = ProgressTracker::new();
        assert!(tracker.upsert(progress(42, 10, 0)));
        assert_eq!(tracker.get(42).map(|p| p.progress), Some(10));

        assert!(tracker.remove(42).is_some());
        assert!(tracker.get(42).is_none());
        assert!(tracker.is_empty());
    }

    #[test]
    fn newer_event_replaces_older() {
        let mut tracker = ProgressTracker::new();
        assert!(tracker.upsert(progress(1, 10, 0)));
        assert!(tracker.upsert(progress(1, 50, 5)));
        assert_eq!(tracker.get(1).map(|p| p.progress), Some(50));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn stale_event_is_rejected() {
        let mut tracker = ProgressTracker::new();
        assert!(tracker.upsert(progress(1, 50, 10)));
        assert!(!tracker.upsert(progress(1, 20, 5)));
        assert_eq!(tracker.get(1).map(|p| p.progress), Some(50));
    }

    #[test]
    fn remove_unknown_job_is_none() {
        let mut tracker = ProgressTracker::new();
        assert!(tracker.remove(7).is_none());
    }
}
