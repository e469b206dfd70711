use std::time::Duration;

use url::Url;

use crate::{
    consts::{
        DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_HEARTBEAT_INTERVAL_MS, DEFAULT_MAX_RECONNECT_ATTEMPTS,
        DEFAULT_RECONNECT_INTERVAL_MS,
    },
    error::StreamError,
};

/// Connection settings for the notification stream.
///
/// `base_url` is the plain HTTP origin of the backend; the WebSocket scheme
/// is derived from it (`http` → `ws`, `https` → `wss`).
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub base_url: String,
    /// Path of the stream endpoint on the backend.
    pub path: String,
    /// Auth token appended as the `token` query parameter. Connecting
    /// without one fails fast; the client never retries a missing token.
    pub token: Option<String>,
    pub auto_connect: bool,
    pub auto_reconnect: bool,
    pub reconnect_interval: Duration,
    /// Consecutive failed sessions before giving up. The initial connect
    /// counts as an attempt, so a budget of 5 means five failed connects in
    /// total; any successful open resets the count. 0 means unlimited.
    pub max_reconnect_attempts: u32,
    pub heartbeat_interval: Duration,
    pub connect_timeout: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            path: "/ws/notifications".to_string(),
            token: None,
            auto_connect: true,
            auto_reconnect: true,
            reconnect_interval: Duration::from_millis(DEFAULT_RECONNECT_INTERVAL_MS),
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            heartbeat_interval: Duration::from_millis(DEFAULT_HEARTBEAT_INTERVAL_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
        }
    }
}

impl StreamConfig {
    pub(crate) fn token_or_err(&self) -> Result<&str, StreamError> {
        match self.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(StreamError::MissingToken),
        }
    }

    /// Build the full WebSocket URL, upgrading the scheme and attaching the
    /// auth token as a query parameter.
    pub(crate) fn build_ws_url(&self) -> Result<Url, StreamError> {
        let token = self.token_or_err()?;
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(StreamError::InvalidUrl("server URL is required".into()));
        }

        let mut ws_url = Url::parse(trimmed)
            .map_err(|error| StreamError::InvalidUrl(format!("{trimmed}: {error}")))?;
        match ws_url.scheme() {
            "http" => ws_url
                .set_scheme("ws")
                .map_err(|_| StreamError::InvalidUrl("cannot convert scheme to ws".into()))?,
            "https" => ws_url
                .set_scheme("wss")
                .map_err(|_| StreamError::InvalidUrl("cannot convert scheme to wss".into()))?,
            other => {
                return Err(StreamError::InvalidUrl(format!(
                    "server URL must start with http:// or https://, got {other}://"
                )))
            }
        }

        let mut path = ws_url.path().trim_end_matches('/').to_string();
        path.push_str(&self.path);
        ws_url.set_path(&path);
        ws_url.query_pairs_mut().append_pair("token", token);
        Ok(ws_url)
    }
}

/// Strip the token from a stream URL before it reaches any log line.
pub(crate) fn redact_ws_url(url: &Url) -> String {
    let mut redacted = url.clone();
    if redacted.query().is_some() {
        redacted.set_query(Some("token=***"));
    }
    redacted.to_string()
}
