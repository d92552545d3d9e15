// ── Central reactive state store ──
//
// Holds the current `DashboardState` behind a `watch` channel. Writers
// replace whole snapshots; readers either grab the latest or subscribe
// for changes. Publishing an unchanged snapshot (same `Arc`s) is a no-op
// and wakes nobody.

use std::sync::Arc;

use tokio::sync::watch;

use crate::model::MonitorDashboard;
use crate::reducer::DashboardState;
use crate::stream::StateStream;

/// Reactive store for the monitor dashboard state.
pub struct MonitorStore {
    state: watch::Sender<DashboardState>,
}

impl MonitorStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(DashboardState::empty());
        Self { state }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    /// The current state (cheap clone, two `Arc` bumps).
    pub fn snapshot(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    pub fn dashboard(&self) -> Arc<MonitorDashboard> {
        Arc::clone(self.state.borrow().dashboard())
    }

    pub fn node_count(&self) -> usize {
        self.state.borrow().dashboard().nodes.len()
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Replace the dashboard from a fresh REST fetch, keeping health
    /// records accumulated this session.
    pub fn hydrate(&self, dashboard: Arc<MonitorDashboard>) {
        self.state.send_modify(|state| {
            *state = state.with_dashboard(dashboard);
        });
    }

    /// Publish a new state snapshot.
    ///
    /// Skips the send entirely when the snapshot is pointer-identical to
    /// the current one, so no-op reductions never wake subscribers.
    /// Returns `true` if subscribers were notified.
    pub fn publish(&self, next: DashboardState) -> bool {
        self.state.send_if_modified(|state| {
            let unchanged = Arc::ptr_eq(state.dashboard(), next.dashboard())
                && Arc::ptr_eq(state.health(), next.health());
            if unchanged {
                return false;
            }
            *state = next;
            true
        })
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe(&self) -> StateStream<DashboardState> {
        StateStream::new(self.state.subscribe())
    }
}

impl Default for MonitorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gatewatch_api::ws::{NodeEvent, WsMessage};

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

    #[test]
    fn hydrate_replaces_dashboard() {
        let store = MonitorStore::new();
        assert_eq!(store.node_count(), 0);

        store.hydrate(dashboard());
        assert_eq!(store.node_count(), 1);
        assert_eq!(store.dashboard().account_id, "acct-1");
    }

    #[tokio::test]
    async fn publish_notifies_subscribers() {
        let store = MonitorStore::new();
        store.hydrate(dashboard());
        let mut sub = store.subscribe();

        let event = NodeEvent {
            node_id: "n1".into(),
            node_name: None,
            status: Some("offline".into()),
            error: None,
            success_rate: None,
            avg_response_time: None,
            total_requests: None,
            failed_requests: None,
            last_ping_ms: None,
            timestamp: None,
        };
        let next = store.snapshot().apply(&WsMessage::NodeStatus(event));

        assert!(store.publish(next));
        let state = sub.changed().await.unwrap();
        assert_eq!(
            state.dashboard().node("n1").unwrap().status,
            NodeStatus::Offline
        );
    }

    #[test]
    fn publishing_identical_state_is_a_no_op() {
        let store = MonitorStore::new();
        store.hydrate(dashboard());

        // Reduction over an unknown node yields the same Arcs back
        let event = NodeEvent {
            node_id: "ghost".into(),
            node_name: None,
            status: Some("offline".into()),
            error: None,
            success_rate: None,
            avg_response_time: None,
            total_requests: None,
            failed_requests: None,
            last_ping_ms: None,
            timestamp: None,
        };
        let next = store.snapshot().apply(&WsMessage::NodeStatus(event));

        assert!(!store.publish(next), "identical snapshot must not notify");
    }
}
