//! Per-operator notification preferences.
//!
//! A single mutable document, loaded once at session start and persisted on
//! every mutation. The stream core only reads it; the settings screen is the
//! sole writer. A failed write degrades the store to memory-only for the
//! rest of the session instead of surfacing an error.

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Mutex, PoisonError,
    },
};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::{
    consts::{DEFAULT_MAX_TOASTS, DEFAULT_QUIET_HOURS_END, DEFAULT_QUIET_HOURS_START},
    model::{Severity, ToastPosition},
};

/// Monotonic counter for generating unique temp file suffixes.
static FILE_SUFFIX_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuietHours {
    pub enabled: bool,
    /// `HH:MM`, inclusive start of the window.
    pub start: String,
    /// `HH:MM`, exclusive end of the window. A start later than the end
    /// means the window wraps across midnight.
    pub end: String,
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            enabled: false,
            start: DEFAULT_QUIET_HOURS_START.to_string(),
            end: DEFAULT_QUIET_HOURS_END.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub sound_enabled: bool,
    pub desktop_enabled: bool,
    pub vibration_enabled: bool,
    pub position: ToastPosition,
    /// Severities the operator wants surfaced. Anything outside the set is
    /// dropped before dedup even sees it.
    pub severities: BTreeSet<Severity>,
    /// Notification types explicitly muted by the operator.
    pub muted_types: BTreeSet<String>,
    pub quiet_hours: QuietHours,
    /// Cap on concurrently visible toasts, consumed by the toast surface.
    pub max_toasts: u8,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            desktop_enabled: true,
            vibration_enabled: false,
            position: ToastPosition::TopRight,
            severities: Severity::ALL.into_iter().collect(),
            muted_types: BTreeSet::new(),
            quiet_hours: QuietHours::default(),
            max_toasts: DEFAULT_MAX_TOASTS,
        }
    }
}

/// Partial update merged into the current record; `None` keeps the existing
/// value, field by field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PreferencesUpdate {
    pub sound_enabled: Option<bool>,
    pub desktop_enabled: Option<bool>,
    pub vibration_enabled: Option<bool>,
    pub position: Option<ToastPosition>,
    pub severities: Option<BTreeSet<Severity>>,
    pub muted_types: Option<BTreeSet<String>>,
    pub quiet_hours: Option<QuietHoursUpdate>,
    pub max_toasts: Option<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuietHoursUpdate {
    pub enabled: Option<bool>,
    pub start: Option<String>,
    pub end: Option<String>,
}

pub struct PreferenceStore {
    path: Option<PathBuf>,
    inner: Mutex<Preferences>,
    /// Set after the first failed write so the failure is logged exactly once.
    persist_degraded: AtomicBool,
}

impl PreferenceStore {
    /// Store without durable backing; preferences live for the session only.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            inner: Mutex::new(Preferences::default()),
            persist_degraded: AtomicBool::new(false),
        }
    }

    /// Load preferences from `path`, falling back to defaults when the file
    /// is missing or unreadable.
    pub fn load(path: PathBuf) -> Self {
        let prefs = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Preferences>(&content) {
                Ok(prefs) => prefs,
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "preference file unreadable, using defaults");
                    Preferences::default()
                }
            },
            Err(_) => Preferences::default(),
        };

        Self {
            path: Some(path),
            inner: Mutex::new(prefs),
            persist_degraded: AtomicBool::new(false),
        }
    }

    pub fn get(&self) -> Preferences {
        self.lock().clone()
    }

    /// Merge a partial update into the current record and persist the result.
    pub fn update(&self, update: PreferencesUpdate) -> Preferences {
        let merged = {
            let mut prefs = self.lock();
            apply_update(&mut prefs, update);
            prefs.clone()
        };
        self.persist(&merged);
        merged
    }

    /// Restore documented defaults and persist them.
    pub fn reset(&self) -> Preferences {
        let defaults = Preferences::default();
        *self.lock() = defaults.clone();
        self.persist(&defaults);
        defaults
    }

    /// True unless the operator explicitly muted the type.
    pub fn should_show_type(&self, notification_type: &str) -> bool {
        !self.lock().muted_types.contains(notification_type)
    }

    /// True iff the severity is in the inclusion set.
    pub fn should_show_severity(&self, severity: Severity) -> bool {
        self.lock().severities.contains(&severity)
    }

    /// True iff quiet hours are enabled and `now` falls within `[start, end)`,
    /// wrapping across midnight when `start > end`.
    pub fn is_quiet_hours(&self, now: NaiveTime) -> bool {
        let quiet = self.lock().quiet_hours.clone();
        if !quiet.enabled {
            return false;
        }
        let (Some(start), Some(end)) = (parse_hhmm(&quiet.start), parse_hhmm(&quiet.end)) else {
            tracing::warn!(start = %quiet.start, end = %quiet.end, "unparseable quiet-hours window, treating as off");
            return false;
        };

        if start < end {
            now >= start && now < end
        } else {
            // start == end is an empty window
            start > end && (now >= start || now < end)
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Preferences> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, prefs: &Preferences) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        if self.persist_degraded.load(Ordering::Relaxed) {
            return;
        }
        if let Err(error) = write_atomically(path, prefs) {
            self.persist_degraded.store(true, Ordering::Relaxed);
            tracing::warn!(path = %path.display(), %error, "failed to persist preferences, continuing in-memory only");
        }
    }
}

fn apply_update(prefs: &mut Preferences, update: PreferencesUpdate) {
    if let Some(value) = update.sound_enabled {
        prefs.sound_enabled = value;
    }
    if let Some(value) = update.desktop_enabled {
        prefs.desktop_enabled = value;
    }
    if let Some(value) = update.vibration_enabled {
        prefs.vibration_enabled = value;
    }
    if let Some(value) = update.position {
        prefs.position = value;
    }
    if let Some(value) = update.severities {
        prefs.severities = value;
    }
    if let Some(value) = update.muted_types {
        prefs.muted_types = value;
    }
    if let Some(quiet) = update.quiet_hours {
        if let Some(value) = quiet.enabled {
            prefs.quiet_hours.enabled = value;
        }
        if let Some(value) = quiet.start {
            prefs.quiet_hours.start = value;
        }
        if let Some(value) = quiet.end {
            prefs.quiet_hours.end = value;
        }
    }
    if let Some(value) = update.max_toasts {
        prefs.max_toasts = value.max(1);
    }
}

fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

fn write_atomically(path: &Path, prefs: &Preferences) -> Result<(), String> {
    let content = serde_json::to_string_pretty(prefs)
        .map_err(|error| format!("failed to serialize preferences: {error}"))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|error| format!("failed to create preference directory: {error}"))?;
    }
    let suffix = FILE_SUFFIX_COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_path = path.with_extension(format!("tmp-{suffix}"));
    fs::write(&tmp_path, content)
        .map_err(|error| format!("failed to write preference temp file: {error}"))?;
    if let Err(error) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(format!("failed to replace preference file: {error}"));
    }
    Ok(())
}
