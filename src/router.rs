//! Frame decoding and per-type dispatch.
//!
//! Stateless: every text frame is decoded into a [`StreamMessage`] and
//! matched straight to its handler. Malformed frames and server-added event
//! kinds we do not know yet are logged and dropped; neither touches the
//! connection.

use chrono::{DateTime, Local, NaiveTime, Utc};

use crate::{
    consts::LOG_PAYLOAD_PREVIEW_CHARS,
    core::{truncate_message, NotifyCore},
    dispatch,
    model::StreamMessage,
};

/// Entry point for every inbound text frame.
pub(crate) fn handle_frame(core: &NotifyCore, text: &str) {
    if let Some(message) = decode_frame(text) {
        route(core, message, Utc::now(), Local::now().time());
    }
}

/// Decode one frame. Returns `None` (after logging) for malformed JSON and
/// for unknown `type` values.
pub(crate) fn decode_frame(text: &str) -> Option<StreamMessage> {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(
                %error,
                payload = %truncate_message(text, LOG_PAYLOAD_PREVIEW_CHARS),
                "dropping malformed frame"
            );
            return None;
        }
    };

    let kind = value
        .get("type")
        .and_then(|v| v.as_str())
        .unwrap_or("<missing>")
        .to_string();

    match serde_json::from_value::<StreamMessage>(value) {
        Ok(message) => Some(message),
        Err(error) => {
            tracing::warn!(
                %error,
                kind = %kind,
                "dropping unknown or malformed event"
            );
            None
        }
    }
}

pub(crate) fn route(
    core: &NotifyCore,
    message: StreamMessage,
    now: DateTime<Utc>,
    local_time: NaiveTime,
) {
    match message {
        StreamMessage::TranscodeProgress(event) => dispatch::handle_transcode_progress(core, event),
        StreamMessage::TranscodeComplete(event) => dispatch::handle_transcode_complete(core, event),
        StreamMessage::TranscodeFailed(event) => dispatch::handle_transcode_failed(core, event),
        StreamMessage::AdminNotification(event) => {
            dispatch::handle_admin_notification(core, event, now, local_time)
        }
        StreamMessage::SystemMessage(event) => dispatch::handle_system_message(core, event),
        StreamMessage::Connected => dispatch::handle_connected(core),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;

    #[test]
    fn decodes_transcode_progress() {
        let json = r#"{"type":"transcode_progress","job_id":42,"status":"encoding","progress":35,"timestamp":"2026-08-30T12:00:00Z"}"#;
        match decode_frame(json) {
            Some(StreamMessage::TranscodeProgress(event)) => {
                assert_eq!(event.job_id, 42);
                assert_eq!(event.progress, 35);
                assert!(event.message.is_none());
            }
            other => panic!("expected TranscodeProgress, got {other:?}"),
        }
    }

    #[test]
    fn over_range_progress_is_clamped() {
        let json = r#"{"type":"transcode_progress","job_id":42,"status":"encoding","progress":120,"timestamp":"2026-08-30T12:00:00Z"}"#;
        match decode_frame(json) {
            Some(StreamMessage::TranscodeProgress(event)) => assert_eq!(event.progress, 100),
            other => panic!("expected TranscodeProgress, got {other:?}"),
        }
    }

    #[test]
    fn decodes_transcode_complete() {
        let json = r#"{"type":"transcode_complete","job_id":42,"title":"Big Movie","format":"h264","size_bytes":123456,"timestamp":"2026-08-30T12:00:00Z"}"#;
        match decode_frame(json) {
            Some(StreamMessage::TranscodeComplete(event)) => {
                assert_eq!(event.title, "Big Movie");
                assert_eq!(event.size_bytes, 123_456);
            }
            other => panic!("expected TranscodeComplete, got {other:?}"),
        }
    }

    #[test]
    fn decodes_transcode_failed() {
        let json = r#"{"type":"transcode_failed","job_id":7,"title":"Clip","error":"ffmpeg exited 1","timestamp":"2026-08-30T12:00:00Z"}"#;
        match decode_frame(json) {
            Some(StreamMessage::TranscodeFailed(event)) => {
                assert_eq!(event.error, "ffmpeg exited 1");
            }
            other => panic!("expected TranscodeFailed, got {other:?}"),
        }
    }

    #[test]
    fn decodes_admin_notification() {
        let json = r#"{"type":"admin_notification","notification_id":9,"notification_type":"security","severity":"critical","title":"Login spike","content":"Unusual admin logins","link":"/audit","timestamp":"2026-08-30T12:00:00Z"}"#;
        match decode_frame(json) {
            Some(StreamMessage::AdminNotification(event)) => {
                assert_eq!(event.severity, Severity::Critical);
                assert_eq!(event.link.as_deref(), Some("/audit"));
            }
            other => panic!("expected AdminNotification, got {other:?}"),
        }
    }

    #[test]
    fn decodes_system_message_and_connected() {
        let json = r#"{"type":"system_message","message":"maintenance tonight","level":"info","timestamp":"2026-08-30T12:00:00Z"}"#;
        assert!(matches!(
            decode_frame(json),
            Some(StreamMessage::SystemMessage(_))
        ));
        assert!(matches!(
            decode_frame(r#"{"type":"connected"}"#),
            Some(StreamMessage::Connected)
        ));
    }

    #[test]
    fn unknown_type_is_dropped() {
        assert!(decode_frame(r#"{"type":"server_added_thing","foo":1}"#).is_none());
    }

    #[test]
    fn malformed_json_is_dropped() {
        assert!(decode_frame("not json at all").is_none());
        assert!(decode_frame(r#"{"no_type_field":true}"#).is_none());
    }
}
