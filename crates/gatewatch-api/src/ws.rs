//! WebSocket live monitor stream with auto-reconnect.
//!
//! Connects to the gateway's `/api/monitor/ws` endpoint and streams parsed
//! monitor events through a [`tokio::sync::broadcast`] channel. Handles
//! reconnection with exponential backoff + jitter automatically and
//! publishes the connection state through a [`tokio::sync::watch`] channel.
//!
//! # Example
//!
//! ```rust,ignore
//! use gatewatch_api::ws::{MonitorSocket, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let cancel = CancellationToken::new();
//! let ws_url = Url::parse("wss://gw.example.com/api/monitor/ws")?;
//!
//! let socket = MonitorSocket::connect(ws_url, ReconnectConfig::default(), cancel.clone());
//! let mut rx = socket.subscribe();
//!
//! while let Ok(msg) = rx.recv().await {
//!     println!("{msg:?}");
//! }
//!
//! socket.shutdown();
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

// ── Broadcast channel capacity ───────────────────────────────────────

const MESSAGE_CHANNEL_CAPACITY: usize = 1024;

// ── Message types ────────────────────────────────────────────────────

/// A parsed event from the monitor WebSocket stream.
///
/// The gateway pushes three kinds of events; anything else is dropped at
/// parse time for forward compatibility.
#[derive(Debug, Clone, PartialEq)]
pub enum WsMessage {
    /// A node changed operational status (online/offline/checking).
    NodeStatus(NodeEvent),
    /// A node reported fresh metrics (success rate, latency, counters).
    NodeMetrics(NodeEvent),
    /// A health probe completed for a node.
    HealthCheck(HealthCheckEvent),
}

impl WsMessage {
    /// The node this event concerns.
    pub fn node_id(&self) -> &str {
        match self {
            Self::NodeStatus(e) | Self::NodeMetrics(e) => &e.node_id,
            Self::HealthCheck(e) => &e.node_id,
        }
    }
}

/// Payload of `node_status` and `node_metrics` events.
///
/// A sparse patch: every field beyond `node_id` is optional, and absent
/// fields mean "unchanged" -- never "reset to default".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEvent {
    pub node_id: String,
    #[serde(default)]
    pub node_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub success_rate: Option<f64>,
    #[serde(default)]
    pub avg_response_time: Option<i64>,
    #[serde(default)]
    pub total_requests: Option<i64>,
    #[serde(default)]
    pub failed_requests: Option<i64>,
    #[serde(default)]
    pub last_ping_ms: Option<i64>,
    /// Event timestamp, ISO-8601. Also becomes the node's `last_check_at`.
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Payload of `health_check` events.
///
/// Unlike [`NodeEvent`], absent fields here take defaults -- each probe
/// result is complete in itself and fully replaces the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckEvent {
    pub node_id: String,
    #[serde(default)]
    pub check_time: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub response_time_ms: i64,
    #[serde(default)]
    pub error_message: String,
    #[serde(default = "default_check_method")]
    pub check_method: String,
}

fn default_check_method() -> String {
    "api".into()
}

// ── Envelope parsing ─────────────────────────────────────────────────

/// Raw envelope the gateway sends: `{ "type": "...", "payload": {...} }`.
#[derive(Debug, Deserialize)]
struct WsEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
}

/// Parse a WebSocket text frame into a [`WsMessage`].
///
/// Returns `None` for malformed frames (logged, discarded) and for
/// unrecognized event kinds (silently ignored -- newer gateways may emit
/// kinds this client doesn't know about).
pub fn parse_message(text: &str) -> Option<WsMessage> {
    let envelope: WsEnvelope = match serde_json::from_str(text) {
        Ok(e) => e,
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse monitor envelope");
            return None;
        }
    };

    let parsed = match envelope.kind.as_str() {
        "node_status" => serde_json::from_value(envelope.payload).map(WsMessage::NodeStatus),
        "node_metrics" => serde_json::from_value(envelope.payload).map(WsMessage::NodeMetrics),
        "health_check" => serde_json::from_value(envelope.payload).map(WsMessage::HealthCheck),
        other => {
            tracing::trace!(kind = other, "ignoring unknown monitor event kind");
            return None;
        }
    };

    match parsed {
        Ok(msg) => Some(msg),
        Err(e) => {
            tracing::debug!(error = %e, kind = %envelope.kind, "malformed event payload");
            None
        }
    }
}

// ── Connection state ─────────────────────────────────────────────────

/// Observable connection state of the monitor socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for WebSocket reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay (before jitter). Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            max_retries: None,
        }
    }
}

// ── MonitorSocket ────────────────────────────────────────────────────

/// Handle to a running monitor WebSocket stream.
///
/// The background task owns the only transport handle; it is closed and
/// replaced across reconnects, never shared. Drop all receivers and call
/// [`shutdown`](Self::shutdown) to tear down the task.
pub struct MonitorSocket {
    msg_rx: broadcast::Receiver<Arc<WsMessage>>,
    state_rx: watch::Receiver<SocketState>,
    cancel: CancellationToken,
}

impl MonitorSocket {
    /// Spawn the connection loop against the given WebSocket URL.
    ///
    /// Never fails: connection errors are absorbed by the reconnect loop.
    /// Returns immediately; the first connection attempt happens
    /// asynchronously.
    pub fn connect(ws_url: Url, reconnect: ReconnectConfig, cancel: CancellationToken) -> Self {
        let (msg_tx, msg_rx) = broadcast::channel(MESSAGE_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(SocketState::Disconnected);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            ws_loop(ws_url, msg_tx, state_tx, reconnect, task_cancel).await;
        });

        Self {
            msg_rx,
            state_rx,
            cancel,
        }
    }

    /// Get a new broadcast receiver for the message stream.
    ///
    /// If a consumer falls behind, it receives
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<WsMessage>> {
        self.msg_rx.resubscribe()
    }

    /// Subscribe to connection state changes.
    pub fn state(&self) -> watch::Receiver<SocketState> {
        self.state_rx.clone()
    }

    /// Signal the background task to shut down.
    ///
    /// Cancels any pending reconnect timer and closes the live connection.
    /// Safe to call multiple times.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on drop, backoff → reconnect.
///
/// The attempt counter resets to zero only on a successful open (inside
/// `connect_and_read`) and increments only when a reconnect actually
/// fires -- a close while the counter is fresh starts back at the
/// initial delay.
async fn ws_loop(
    ws_url: Url,
    msg_tx: broadcast::Sender<Arc<WsMessage>>,
    state_tx: watch::Sender<SocketState>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;
    let _ = state_tx.send(SocketState::Connecting);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&ws_url, &msg_tx, &state_tx, &cancel, &mut attempt) => {
                match result {
                    Ok(()) => {
                        tracing::info!("monitor stream disconnected, reconnecting");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "monitor stream error");
                    }
                }

                if let Some(max) = reconnect.max_retries {
                    if attempt >= max {
                        tracing::error!(
                            max_retries = max,
                            "reconnection limit reached, giving up"
                        );
                        break;
                    }
                }

                let delay = backoff_delay(attempt, &reconnect);
                let _ = state_tx.send(SocketState::Disconnected);
                tracing::info!(
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    attempt,
                    "waiting before reconnect"
                );

                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(delay) => {}
                }

                attempt += 1;
                let _ = state_tx.send(SocketState::Reconnecting { attempt });
            }
        }
    }

    let _ = state_tx.send(SocketState::Disconnected);
    tracing::debug!("monitor socket loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one WebSocket connection and read messages until it drops.
///
/// Resets the caller's attempt counter on a successful open -- the next
/// disconnection backs off from the initial delay again.
async fn connect_and_read(
    url: &Url,
    msg_tx: &broadcast::Sender<Arc<WsMessage>>,
    state_tx: &watch::Sender<SocketState>,
    cancel: &CancellationToken,
    attempt: &mut u32,
) -> Result<(), crate::error::Error> {
    tracing::info!(url = %url, "connecting to monitor stream");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| crate::error::Error::WebSocketConnect(e.to_string()))?;

    *attempt = 0;
    let _ = state_tx.send(SocketState::Connected);
    tracing::info!("monitor stream connected");

    let (_write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        if let Some(msg) = parse_message(&text) {
                            // Ignore send errors -- no active subscribers right now
                            let _ = msg_tx.send(Arc::new(msg));
                        }
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite handles pong replies automatically
                        tracing::trace!("monitor stream ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "close frame received"
                            );
                        } else {
                            tracing::info!("close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(crate::error::Error::WebSocketConnect(e.to_string()));
                    }
                    None => {
                        // Stream ended without a close frame
                        tracing::info!("monitor stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with positive jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`, jitter in
/// `[0, 0.3 * capped]` -- so the actual delay falls in
/// `[capped, 1.3 * capped]`. The jitter spreads reconnection storms when
/// many dashboards drop at once.
fn backoff_delay(attempt: u32, config: &ReconnectConfig) -> Duration {
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(i32::try_from(attempt).unwrap_or(i32::MAX));
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic jitter seeded from the attempt number.
    // Not cryptographically random, but good enough for backoff spread.
    let jitter_frac = (f64::from(attempt).mul_add(7.3, 1.7)).sin().abs();
    let with_jitter = capped * 0.3_f64.mul_add(jitter_frac, 1.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
