// ── Monitor abstraction ──
//
// Full lifecycle management for a gateway monitor session. Handles
// dashboard hydration over REST, the live WebSocket stream with
// frame-coalesced state updates, and reactive streaming through the
// MonitorStore.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use gatewatch_api::transport::{TlsMode, TransportConfig};
use gatewatch_api::types::{CreateShareRequest, HealthHistoryQuery, ShareDto};
use gatewatch_api::ws::{MonitorSocket, SocketState, WsMessage};
use gatewatch_api::GatewayClient;

use crate::coalescer::Coalescer;
use crate::config::{MonitorAuth, MonitorConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::{HealthCheckRecord, MonitorDashboard};
use crate::reducer::DashboardState;
use crate::store::MonitorStore;
use crate::stream::StateStream;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Failed,
}

// ── Monitor ──────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<MonitorInner>`. Manages the session
/// lifecycle: REST hydration, the live WebSocket stream, coalesced
/// state publication, and reactive streaming.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    config: MonitorConfig,
    client: GatewayClient,
    store: Arc<MonitorStore>,
    connection_state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Monitor {
    /// Create a new Monitor from configuration. Does NOT connect --
    /// call [`connect()`](Self::connect) to hydrate and start the stream.
    pub fn new(config: MonitorConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let api_key = match &config.auth {
            MonitorAuth::ApiKey(key) => Some(key.clone()),
            MonitorAuth::ShareToken(_) => None,
        };
        let client = GatewayClient::new(config.gateway.clone(), api_key, &transport)?;

        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);

        Ok(Self {
            inner: Arc::new(MonitorInner {
                config,
                client,
                store: Arc::new(MonitorStore::new()),
                connection_state,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Access the monitor configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    /// Access the underlying MonitorStore.
    pub fn store(&self) -> &Arc<MonitorStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Connect to the gateway.
    ///
    /// Fetches the initial dashboard snapshot, then (unless live updates
    /// are disabled) opens the WebSocket stream and spawns the bridge
    /// task that folds events into the store.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Connecting);

        if let Err(e) = self.refresh().await {
            let _ = self.inner.connection_state.send(ConnectionState::Failed);
            return Err(e);
        }

        if self.inner.config.live_updates {
            let config = &self.inner.config;
            let (account_id, share_token) = match &config.auth {
                MonitorAuth::ApiKey(_) => (config.account_id.as_deref(), None),
                MonitorAuth::ShareToken(token) => (None, Some(token.as_str())),
            };
            let ws_url = self.inner.client.ws_url(account_id, share_token)?;

            let socket = MonitorSocket::connect(
                ws_url,
                config.reconnect.clone(),
                self.inner.cancel.child_token(),
            );

            let mut handles = self.inner.task_handles.lock().await;
            handles.push(tokio::spawn(bridge_task(
                Arc::clone(&self.inner.store),
                socket.subscribe(),
                config.frame_interval,
                self.inner.cancel.clone(),
            )));
            handles.push(tokio::spawn(state_task(
                self.clone(),
                socket.state(),
                self.inner.cancel.clone(),
            )));
        }

        let _ = self.inner.connection_state.send(ConnectionState::Connected);
        info!("monitor connected");
        Ok(())
    }

    /// Disconnect from the gateway.
    ///
    /// Cancels the stream and bridge tasks -- any update still waiting
    /// for its frame flush is dropped, never published -- and resets the
    /// state to [`Disconnected`](ConnectionState::Disconnected).
    pub async fn disconnect(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Disconnected);
        debug!("monitor disconnected");
    }

    /// Fetch a fresh dashboard snapshot and hydrate the store.
    ///
    /// Health records accumulated from the live stream are kept.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let dto = match &self.inner.config.auth {
            MonitorAuth::ShareToken(token) => {
                self.inner.client.get_shared_dashboard(token).await?
            }
            MonitorAuth::ApiKey(_) => {
                self.inner
                    .client
                    .get_dashboard(self.inner.config.account_id.as_deref())
                    .await?
            }
        };

        let dashboard = Arc::new(MonitorDashboard::from(dto));
        debug!(nodes = dashboard.nodes.len(), "dashboard refresh complete");
        self.inner.store.hydrate(dashboard);
        Ok(())
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: connect, run closure, disconnect.
    ///
    /// Optimized for CLI commands: disables the live stream since we
    /// only need a single request-response cycle.
    pub async fn oneshot<F, Fut, T>(config: MonitorConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Monitor) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.live_updates = false;

        let monitor = Monitor::new(cfg)?;
        monitor.connect().await?;
        let result = f(monitor.clone()).await;
        monitor.disconnect().await;
        result
    }

    // ── Shares ───────────────────────────────────────────────────

    /// Create a read-only monitor share.
    pub async fn create_share(&self, expire_in: &str) -> Result<ShareDto, CoreError> {
        let req = CreateShareRequest {
            account_id: self.inner.config.account_id.clone(),
            expire_in: expire_in.into(),
        };
        Ok(self.inner.client.create_share(&req).await?)
    }

    /// List the account's monitor shares.
    pub async fn list_shares(&self) -> Result<Vec<ShareDto>, CoreError> {
        Ok(self.inner.client.list_shares().await?)
    }

    /// Revoke a monitor share by id.
    pub async fn revoke_share(&self, share_id: &str) -> Result<(), CoreError> {
        self.inner
            .client
            .revoke_share(share_id)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    CoreError::ShareNotFound {
                        identifier: share_id.into(),
                    }
                } else {
                    e.into()
                }
            })
    }

    // ── Health history ───────────────────────────────────────────

    /// Fetch historical health probes for one node.
    pub async fn health_history(
        &self,
        node_id: &str,
        query: &HealthHistoryQuery,
    ) -> Result<Vec<HealthCheckRecord>, CoreError> {
        let share_token = match &self.inner.config.auth {
            MonitorAuth::ShareToken(token) => Some(token.as_str()),
            MonitorAuth::ApiKey(_) => None,
        };

        let resp = self
            .inner
            .client
            .get_health_history(node_id, query, share_token)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    CoreError::NodeNotFound {
                        identifier: node_id.into(),
                    }
                } else {
                    e.into()
                }
            })?;

        Ok(resp
            .checks
            .into_iter()
            .map(|c| HealthCheckRecord::from_dto(&resp.node_id, c))
            .collect())
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Subscribe to dashboard state changes.
    pub fn state(&self) -> StateStream<DashboardState> {
        self.inner.store.subscribe()
    }

    /// Current dashboard snapshot (delegates to the store).
    pub fn dashboard(&self) -> Arc<MonitorDashboard> {
        self.inner.store.dashboard()
    }
}

// ── Background tasks ─────────────────────────────────────────────

enum Absorb {
    Continue,
    Armed,
    Closed,
}

/// Stash one received event in the pending slot. A later event within
/// the same frame overwrites it; superseded events never reach the
/// reducer.
fn absorb(
    pending: &mut Coalescer<Arc<WsMessage>>,
    msg: Result<Arc<WsMessage>, broadcast::error::RecvError>,
) -> Absorb {
    match msg {
        Ok(msg) => {
            if pending.offer(msg) {
                Absorb::Armed
            } else {
                Absorb::Continue
            }
        }
        Err(broadcast::error::RecvError::Lagged(skipped)) => {
            warn!(skipped, "monitor event stream lagged, events dropped");
            Absorb::Continue
        }
        Err(broadcast::error::RecvError::Closed) => Absorb::Closed,
    }
}

/// Fold live events into the store, at most one publish per frame.
///
/// The pending slot is last-write-wins: events arriving within one frame
/// interval replace each other, and only the survivor is applied to the
/// current state and published when the frame timer fires. Cancellation
/// drops any pending event without publishing it.
async fn bridge_task(
    store: Arc<MonitorStore>,
    mut messages: broadcast::Receiver<Arc<WsMessage>>,
    frame: Duration,
    cancel: CancellationToken,
) {
    let mut pending: Coalescer<Arc<WsMessage>> = Coalescer::new();
    let mut deadline = Instant::now();

    loop {
        if pending.is_armed() {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep_until(deadline) => {
                    if let Some(msg) = pending.flush() {
                        store.publish(store.snapshot().apply(&msg));
                    }
                }
                msg = messages.recv() => {
                    match absorb(&mut pending, msg) {
                        Absorb::Closed => break,
                        Absorb::Continue | Absorb::Armed => {}
                    }
                }
            }
        } else {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                msg = messages.recv() => {
                    match absorb(&mut pending, msg) {
                        Absorb::Closed => break,
                        Absorb::Armed => deadline = Instant::now() + frame,
                        Absorb::Continue => {}
                    }
                }
            }
        }
    }

    if pending.is_armed() {
        debug!("bridge task cancelled with a pending event, dropping it");
    }
}

/// Mirror socket states into the consumer-facing connection state and
/// re-hydrate the dashboard after each reconnect to fill the event gap.
async fn state_task(
    monitor: Monitor,
    mut socket_state: watch::Receiver<SocketState>,
    cancel: CancellationToken,
) {
    let mut connected_before = false;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = socket_state.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = socket_state.borrow_and_update().clone();
                let _ = monitor
                    .inner
                    .connection_state
                    .send(map_socket_state(&state));

                if state == SocketState::Connected {
                    if connected_before {
                        if let Err(e) = monitor.refresh().await {
                            warn!(error = %e, "post-reconnect refresh failed");
                        }
                    }
                    connected_before = true;
                }
            }
        }
    }
}

fn map_socket_state(state: &SocketState) -> ConnectionState {
    match state {
        SocketState::Disconnected => ConnectionState::Disconnected,
        SocketState::Connecting => ConnectionState::Connecting,
        SocketState::Connected => ConnectionState::Connected,
        SocketState::Reconnecting { attempt } => ConnectionState::Reconnecting {
            attempt: *attempt,
        },
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Build a [`TransportConfig`] from the monitor configuration.
fn build_transport(config: &MonitorConfig) -> TransportConfig {
    TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        },
        timeout: config.timeout,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gatewatch_api::ws::NodeEvent;

    use super::*;
    use crate::model::{MonitorNode, NodeStatus};

    fn dashboard() -> Arc<MonitorDashboard> {
        Arc::new(MonitorDashboard {
            account_id: "acct-1".into(),
            account_name: String::new(),
            nodes: vec![Arc::new(MonitorNode {
                id: "n1".into(),
                name: "relay".into(),
                url: String::new(),
                status: NodeStatus::Online,
                weight: 1,
                is_active: true,
                disabled: false,
                success_rate: 100.0,
                avg_response_time: 0,
                last_check_at: None,
                last_error: String::new(),
                last_ping_ms: None,
                trend_24h: Vec::new(),
                total_requests: 0,
                failed_requests: 0,
            })],
            updated_at: String::new(),
        })
    }

    fn metrics_event(rate: f64) -> Arc<WsMessage> {
        Arc::new(WsMessage::NodeMetrics(NodeEvent {
            node_id: "n1".into(),
            node_name: None,
            status: None,
            error: None,
            success_rate: Some(rate),
            avg_response_time: None,
            total_requests: None,
            failed_requests: None,
            last_ping_ms: None,
            timestamp: None,
        }))
    }

    fn status_event(status: &str) -> Arc<WsMessage> {
        Arc::new(WsMessage::NodeStatus(NodeEvent {
            node_id: "n1".into(),
            node_name: None,
            status: Some(status.into()),
            error: None,
            success_rate: None,
            avg_response_time: None,
            total_requests: None,
            failed_requests: None,
            last_ping_ms: None,
            timestamp: None,
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn bridge_coalesces_burst_into_single_publish() {
        let store = Arc::new(MonitorStore::new());
        store.hydrate(dashboard());
        let mut sub = store.subscribe();

        let (tx, rx) = broadcast::channel(16);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(bridge_task(
            Arc::clone(&store),
            rx,
            Duration::from_millis(16),
            cancel.clone(),
        ));

        // Three events inside one frame window
        tx.send(metrics_event(1.0)).unwrap();
        tx.send(metrics_event(2.0)).unwrap();
        tx.send(metrics_event(3.0)).unwrap();

        tokio::time::sleep(Duration::from_millis(25)).await;

        // The single flush carries the final event
        let state = sub.changed().await.unwrap();
        assert_eq!(state.dashboard().node("n1").unwrap().success_rate, 3.0);

        // No further publishes arrive
        let second = tokio::time::timeout(Duration::from_millis(50), sub.changed()).await;
        assert!(second.is_err(), "burst must produce exactly one publish");

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_event_is_dropped_not_merged() {
        let store = Arc::new(MonitorStore::new());
        store.hydrate(dashboard());
        let mut sub = store.subscribe();

        let (tx, rx) = broadcast::channel(16);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(bridge_task(
            Arc::clone(&store),
            rx,
            Duration::from_millis(16),
            cancel.clone(),
        ));

        // Both land inside one frame window; only the second may apply
        tx.send(metrics_event(50.0)).unwrap();
        tx.send(status_event("offline")).unwrap();

        tokio::time::sleep(Duration::from_millis(25)).await;

        let state = sub.changed().await.unwrap();
        let n1 = state.dashboard().node("n1").unwrap();
        assert_eq!(n1.status, NodeStatus::Offline);
        assert_eq!(
            n1.success_rate, 100.0,
            "superseded metrics event leaked into the published state"
        );

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_drops_pending_update() {
        let store = Arc::new(MonitorStore::new());
        store.hydrate(dashboard());

        let (tx, rx) = broadcast::channel(16);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(bridge_task(
            Arc::clone(&store),
            rx,
            Duration::from_millis(16),
            cancel.clone(),
        ));

        tx.send(metrics_event(42.0)).unwrap();
        // Let the bridge absorb the event but cancel before the frame fires
        tokio::time::sleep(Duration::from_millis(2)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(
            store.dashboard().node("n1").unwrap().success_rate,
            100.0,
            "pending update must be dropped on teardown, not published"
        );
    }

    #[test]
    fn socket_state_maps_to_connection_state() {
        assert_eq!(
            map_socket_state(&SocketState::Reconnecting { attempt: 3 }),
            ConnectionState::Reconnecting { attempt: 3 }
        );
        assert_eq!(
            map_socket_state(&SocketState::Connected),
            ConnectionState::Connected
        );
        assert_eq!(
            map_socket_state(&SocketState::Disconnected),
            ConnectionState::Disconnected
        );
    }
}
