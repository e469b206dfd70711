//! Turns routed events into user-facing effects.
//!
//! Admin notifications run the gate chain: type filter, severity filter,
//! unread accounting, dedup, then the individual surfaces (sound, vibration,
//! device-level notification, toast). Transcode events are operational
//! telemetry — they update the progress tracker unconditionally and only
//! their toasts are preference-gated.

use chrono::{DateTime, NaiveTime, Utc};

use crate::{
    consts::{TOAST_DURATION_MS, TOAST_STICKY_MS},
    core::{truncate_message, NotifyCore},
    model::{
        AdminNotification, Severity, SystemMessage, Toast, TranscodeComplete, TranscodeFailed,
        TranscodeProgress, UiEvent,
    },
};

const TRANSCODE_TOAST_KIND: &str = "transcode";

pub(crate) fn handle_admin_notification(
    core: &NotifyCore,
    notification: AdminNotification,
    now: DateTime<Utc>,
    local_time: NaiveTime,
) {
    if !core.prefs.should_show_type(&notification.notification_type) {
        tracing::debug!(
            notification_type = %notification.notification_type,
            "notification type muted, dropping"
        );
        return;
    }
    if !core.prefs.should_show_severity(notification.severity) {
        tracing::debug!(severity = ?notification.severity, "severity filtered, dropping");
        return;
    }

    // Counts toward unread even when dedup suppresses the visible surfaces.
    core.increment_unread();

    let show = core.lock_dedup().should_show(
        &notification.notification_type,
        &notification.title,
        notification.timestamp,
        now,
    );
    if !show {
        tracing::debug!(
            notification_type = %notification.notification_type,
            title = %notification.title,
            "duplicate within window, suppressed"
        );
        return;
    }

    let prefs = core.prefs.get();
    let quiet = core.prefs.is_quiet_hours(local_time);
    let urgent = notification.severity >= Severity::Error;

    if prefs.sound_enabled && !quiet {
        core.publish(UiEvent::Sound);
    }
    if prefs.vibration_enabled && urgent {
        core.publish(UiEvent::Vibrate);
    }
    // OS-level notifications ignore quiet hours: critical alerts must stay
    // visible even when in-app sound is muted.
    if prefs.desktop_enabled {
        core.publish(UiEvent::DeviceNotification {
            title: notification.title.clone(),
            body: truncate_message(&notification.content, 220),
            severity: notification.severity,
        });
    }

    core.publish(UiEvent::Toast(Toast {
        kind: notification.notification_type,
        title: notification.title,
        body: notification.content,
        severity: Some(notification.severity),
        link: notification.link,
        duration_ms: if urgent { TOAST_STICKY_MS } else { TOAST_DURATION_MS },
        position: prefs.position,
    }));
}

pub(crate) fn handle_transcode_progress(core: &NotifyCore, event: TranscodeProgress) {
    let first = event.progress == 0;
    let updated = core.lock_progress().upsert(event.clone());
    if !updated {
        return;
    }
    core.publish(UiEvent::ProgressUpdated(event.clone()));

    let prefs = core.prefs.get();
    if first && prefs.sound_enabled {
        core.publish(UiEvent::Toast(Toast {
            kind: TRANSCODE_TOAST_KIND.to_string(),
            title: format!("Transcode started (job {})", event.job_id),
            body: event.message.unwrap_or(event.status),
            severity: None,
            link: None,
            duration_ms: TOAST_DURATION_MS,
            position: prefs.position,
        }));
    }
}

pub(crate) fn handle_transcode_complete(core: &NotifyCore, event: TranscodeComplete) {
    let was_tracked = core.lock_progress().remove(event.job_id).is_some();
    core.publish(UiEvent::ProgressCleared {
        job_id: event.job_id,
    });

    // A terminal event for an untracked job is a replay; nothing to announce.
    if !was_tracked {
        return;
    }
    tracing::info!(job_id = event.job_id, title = %event.title, "transcode complete");
    let prefs = core.prefs.get();
    if prefs.sound_enabled {
        core.publish(UiEvent::Toast(Toast {
            kind: TRANSCODE_TOAST_KIND.to_string(),
            title: format!("Transcode complete: {}", event.title),
            body: format!("{} ({} bytes)", event.format, event.size_bytes),
            severity: None,
            link: None,
            duration_ms: TOAST_DURATION_MS,
            position: prefs.position,
        }));
    }
}

pub(crate) fn handle_transcode_failed(core: &NotifyCore, event: TranscodeFailed) {
    let was_tracked = core.lock_progress().remove(event.job_id).is_some();
    core.publish(UiEvent::ProgressCleared {
        job_id: event.job_id,
    });

    if !was_tracked {
        return;
    }
    tracing::warn!(job_id = event.job_id, title = %event.title, error = %event.error, "transcode failed");
    let prefs = core.prefs.get();
    if prefs.sound_enabled {
        core.publish(UiEvent::Toast(Toast {
            kind: TRANSCODE_TOAST_KIND.to_string(),
            title: format!("Transcode failed: {}", event.title),
            body: event.error,
            severity: None,
            link: None,
            // failures stay up until dismissed
            duration_ms: TOAST_STICKY_MS,
            position: prefs.position,
        }));
    }
}

pub(crate) fn handle_system_message(core: &NotifyCore, message: SystemMessage) {
    tracing::info!(level = ?message.level, message = %message.message, "system message");
    core.publish(UiEvent::SystemMessage(message));
}

pub(crate) fn handle_connected(core: &NotifyCore) {
    tracing::debug!("stream handshake acknowledged");
    core.publish(UiEvent::HandshakeAcked);
}
