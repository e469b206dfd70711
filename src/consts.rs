pub(crate) const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 30_000;
pub(crate) const DEFAULT_RECONNECT_INTERVAL_MS: u64 = 3_000;
pub(crate) const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub(crate) const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

pub(crate) const DEDUP_TTL_SECS: i64 = 60;

/// Non-sticky toasts auto-dismiss after this long. Sticky toasts use 0.
pub(crate) const TOAST_DURATION_MS: u64 = 5_000;
pub(crate) const TOAST_STICKY_MS: u64 = 0;

pub(crate) const DEFAULT_MAX_TOASTS: u8 = 3;
pub(crate) const DEFAULT_QUIET_HOURS_START: &str = "22:00";
pub(crate) const DEFAULT_QUIET_HOURS_END: &str = "08:00";

/// Capacity of the broadcast channel feeding the presentation layer.
pub(crate) const UI_EVENT_CAPACITY: usize = 256;

pub(crate) const HEARTBEAT_PAYLOAD: &str = "ping";

pub(crate) const LOG_PAYLOAD_PREVIEW_CHARS: usize = 140;
