//! The persistent stream connection.
//!
//! One spawned task owns the WebSocket for its lifetime: it connects,
//! heartbeats, feeds frames to the router, and reconnects on a bounded
//! budget. The heartbeat interval and the reconnect sleep both live inside
//! the task, so stopping the task tears down every timer with it — nothing
//! can fire after `stop()` has been observed.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::{
    config::{redact_ws_url, StreamConfig},
    consts::HEARTBEAT_PAYLOAD,
    core::{truncate_message, unix_now_secs, NotifyCore},
    error::StreamError,
    model::{ConnectionState, UiEvent},
    router,
};

pub struct NotifyClient {
    core: Arc<NotifyCore>,
    config: StreamConfig,
}

impl NotifyClient {
    pub fn new(core: Arc<NotifyCore>, config: StreamConfig) -> Self {
        Self { core, config }
    }

    pub fn core(&self) -> &Arc<NotifyCore> {
        &self.core
    }

    /// Start the stream task. Fails synchronously when no token is
    /// configured or the endpoint is unusable; never retries either case.
    /// Starting while already running is a no-op.
    pub fn start(&self) -> Result<(), StreamError> {
        let ws_url = self.config.build_ws_url()?;

        let (stop_rx, epoch) = {
            let mut runtime = self.core.runtime();
            if runtime.stop_tx.is_some() {
                return Ok(());
            }
            let (stop_tx, stop_rx) = watch::channel(false);
            runtime.stop_tx = Some(stop_tx);
            runtime.stream_epoch = runtime.stream_epoch.wrapping_add(1);
            runtime.should_run = true;
            runtime.last_error = None;
            runtime.reconnect_attempts = 0;
            (stop_rx, runtime.stream_epoch)
        };

        self.core.set_connection_state(ConnectionState::Connecting);
        tracing::info!(url = %redact_ws_url(&ws_url), "starting notification stream");

        let core = Arc::clone(&self.core);
        let config = self.config.clone();
        tokio::spawn(run_stream_loop(core, config, ws_url, stop_rx, epoch));
        Ok(())
    }

    /// Honor the `auto_connect` setting; returns whether a stream was started.
    pub fn start_auto(&self) -> Result<bool, StreamError> {
        if !self.config.auto_connect {
            return Ok(false);
        }
        self.start().map(|_| true)
    }

    /// Stop the stream and cancel any pending reconnect. Idempotent.
    pub fn stop(&self) {
        let was_running = {
            let mut runtime = self.core.runtime();
            runtime.should_run = false;
            match runtime.stop_tx.take() {
                Some(stop_tx) => {
                    let _ = stop_tx.send(true);
                    true
                }
                None => false,
            }
        };

        if was_running {
            self.core.set_connection_state(ConnectionState::Closing);
        } else {
            self.core.set_connection_state(ConnectionState::Disconnected);
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.core.connection_state()
    }

    pub fn is_running(&self) -> bool {
        self.core.runtime().should_run
    }
}

async fn run_stream_loop(
    core: Arc<NotifyCore>,
    config: StreamConfig,
    ws_url: Url,
    mut stop_rx: watch::Receiver<bool>,
    task_epoch: u64,
) {
    let mut attempts: u32 = 0;

    loop {
        if *stop_rx.borrow() {
            break;
        }
        core.set_connection_state(ConnectionState::Connecting);

        match stream_once(&core, &config, &ws_url, &mut stop_rx, &mut attempts).await {
            // Ok means a stop was requested mid-session.
            Ok(()) => break,
            Err(error) => {
                if *stop_rx.borrow() {
                    break;
                }

                tracing::warn!(%error, "stream session ended");
                core.runtime().last_error = Some(error.to_string());
                core.publish(UiEvent::ConnectionError(truncate_message(
                    &error.to_string(),
                    200,
                )));
                core.set_connection_state(ConnectionState::Disconnected);

                if !config.auto_reconnect {
                    break;
                }

                attempts += 1;
                core.runtime().reconnect_attempts = attempts;
                if config.max_reconnect_attempts != 0 && attempts >= config.max_reconnect_attempts {
                    tracing::error!(attempts, "reconnect budget exhausted, manual refresh required");
                    core.publish(UiEvent::ConnectionLost);
                    break;
                }

                tracing::info!(
                    attempt = attempts,
                    delay_ms = config.reconnect_interval.as_millis() as u64,
                    "scheduling reconnect"
                );
                tokio::select! {
                    _ = stop_rx.changed() => {
                        if *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = tokio::time::sleep(config.reconnect_interval) => {}
                }
            }
        }
    }

    let epoch_current = {
        let mut runtime = core.runtime();
        if runtime.stream_epoch == task_epoch {
            runtime.stop_tx = None;
            runtime.should_run = false;
            true
        } else {
            false
        }
    };
    if epoch_current {
        core.set_connection_state(ConnectionState::Disconnected);
    }
}

async fn stream_once(
    core: &NotifyCore,
    config: &StreamConfig,
    ws_url: &Url,
    stop_rx: &mut watch::Receiver<bool>,
    attempts: &mut u32,
) -> Result<(), StreamError> {
    let (mut ws_stream, _) =
        tokio::time::timeout(config.connect_timeout, connect_async(ws_url.as_str()))
            .await
            .map_err(|_| StreamError::ConnectTimeout(config.connect_timeout))?
            .map_err(|error| StreamError::Connection(error.to_string()))?;

    tracing::info!(url = %redact_ws_url(ws_url), "notification stream connected");
    *attempts = 0;
    let now = unix_now_secs();
    {
        let mut runtime = core.runtime();
        runtime.last_connected_at = Some(now);
        runtime.last_event_at = Some(now);
        runtime.last_error = None;
        runtime.reconnect_attempts = 0;
    }
    core.set_connection_state(ConnectionState::Open);

    let mut heartbeat = tokio::time::interval(config.heartbeat_interval);
    heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // the first tick completes immediately
    heartbeat.tick().await;

    loop {
        tokio::select! {
            _ = stop_rx.changed() => {
                if *stop_rx.borrow() {
                    let _ = ws_stream.close(None).await;
                    return Ok(());
                }
            }
            incoming = ws_stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        core.mark_stream_activity(unix_now_secs());
                        router::handle_frame(core, text.as_ref());
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        ws_stream
                            .send(Message::Pong(payload))
                            .await
                            .map_err(|error| {
                                StreamError::Transport(format!("failed to send pong: {error}"))
                            })?;
                    }
                    Some(Ok(Message::Close(_))) => return Err(StreamError::ClosedByServer),
                    Some(Ok(_)) => {
                        core.mark_stream_activity(unix_now_secs());
                    }
                    Some(Err(error)) => return Err(StreamError::Transport(error.to_string())),
                    None => return Err(StreamError::ClosedByServer),
                }
            }
            _ = heartbeat.tick() => {
                if *stop_rx.borrow() {
                    continue;
                }
                ws_stream
                    .send(Message::Text(HEARTBEAT_PAYLOAD.into()))
                    .await
                    .map_err(|error| {
                        StreamError::Transport(format!("failed to send heartbeat: {error}"))
                    })?;
                tracing::trace!("heartbeat sent");
            }
        }
    }
}
