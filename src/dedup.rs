//! Time-windowed suppression of repeated notifications.
//!
//! Keyed by `(kind, title)`. The TTL is anchored to the timestamp of the
//! last *shown* occurrence, never refreshed by suppressed repeats — a
//! chatty duplicate source must not be able to suppress itself forever.
//! Session-local; nothing here is persisted.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::consts::DEDUP_TTL_SECS;

#[derive(Debug, Clone)]
struct DedupEntry {
    /// Repeats suppressed since the entry was last shown.
    count: u64,
    last_shown_at: DateTime<Utc>,
    /// Newest event timestamp seen for this key; older arrivals are replays
    /// and are ignored outright.
    last_event_ts: DateTime<Utc>,
}

pub struct DedupCache {
    ttl: Duration,
    entries: HashMap<(String, String), DedupEntry>,
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new(Duration::seconds(DEDUP_TTL_SECS))
    }
}

impl DedupCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Decide whether a notification identified by `(kind, title)` should be
    /// shown at `now`. Returns true on first sighting or once the previous
    /// show has aged out; otherwise records the suppressed repeat and
    /// returns false.
    pub fn should_show(
        &mut self,
        kind: &str,
        title: &str,
        event_ts: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> bool {
        self.sweep(now);

        match self.entries.get_mut(&(kind.to_string(), title.to_string())) {
            None => {
                self.entries.insert(
                    (kind.to_string(), title.to_string()),
                    DedupEntry {
                        count: 0,
                        last_shown_at: now,
                        last_event_ts: event_ts,
                    },
                );
                true
            }
            Some(entry) => {
                if event_ts < entry.last_event_ts {
                    tracing::debug!(kind, title, "ignoring out-of-order duplicate");
                    return false;
                }
                entry.last_event_ts = event_ts;
                entry.count += 1;
                false
            }
        }
    }

    /// Repeats suppressed for a key within the current window.
    pub fn suppressed_count(&self, kind: &str, title: &str) -> u64 {
        self.entries
            .get(&(kind.to_string(), title.to_string()))
            .map_or(0, |entry| entry.count)
    }

    /// Drop entries whose show timestamp has aged past the TTL.
    fn sweep(&mut self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now - entry.last_shown_at < ttl);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn first_sighting_shows() {
        let mut cache = DedupCache::default();
        assert!(cache.should_show("transcode", "Job done", at(0), at(0)));
    }

    #[test]
    fn repeats_within_window_are_suppressed() {
        let mut cache = DedupCache::default();
        assert!(cache.should_show("alert", "Disk full", at(0), at(0)));
        assert!(!cache.should_show("alert", "Disk full", at(10), at(10)));
        assert!(!cache.should_show("alert", "Disk full", at(30), at(30)));
        assert_eq!(cache.suppressed_count("alert", "Disk full"), 2);
    }

    #[test]
    fn different_titles_do_not_collide() {
        let mut cache = DedupCache::default();
        assert!(cache.should_show("alert", "Disk full", at(0), at(0)));
        assert!(cache.should_show("alert", "Disk almost full", at(1), at(1)));
    }

    #[test]
    fn ttl_is_anchored_to_show_time_not_last_repeat() {
        let mut cache = DedupCache::default();
        assert!(cache.should_show("alert", "Disk full", at(0), at(0)));
        // repeats right up to the edge of the window do not extend it
        assert!(!cache.should_show("alert", "Disk full", at(30), at(30)));
        assert!(!cache.should_show("alert", "Disk full", at(59), at(59)));
        // 60s after the original show, the key shows again
        assert!(cache.should_show("alert", "Disk full", at(60), at(60)));
    }

    #[test]
    fn new_window_resets_suppressed_count() {
        let mut cache = DedupCache::default();
        assert!(cache.should_show("alert", "Disk full", at(0), at(0)));
        assert!(!cache.should_show("alert", "Disk full", at(5), at(5)));
        assert!(cache.should_show("alert", "Disk full", at(61), at(61)));
        assert_eq!(cache.suppressed_count("alert", "Disk full"), 0);
    }

    #[test]
    fn out_of_order_duplicates_are_ignored() {
        let mut cache = DedupCache::default();
        assert!(cache.should_show("alert", "Disk full", at(10), at(10)));
        // an event timestamped before the held entry never shows and is not counted
        assert!(!cache.should_show("alert", "Disk full", at(5), at(12)));
        assert_eq!(cache.suppressed_count("alert", "Disk full"), 0);
    }

    #[test]
    fn expired_entries_are_evicted() {
        let mut cache = DedupCache::default();
        assert!(cache.should_show("a", "x", at(0), at(0)));
        assert!(cache.should_show("b", "y", at(1), at(1)));
        assert!(cache.should_show("c", "z", at(90), at(90)));
        assert_eq!(cache.len(), 1);
    }
}
