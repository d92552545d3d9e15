// ── Dashboard state reducer ──
//
// Pure state transitions for live monitor events. Node events are sparse
// patches: absent fields keep their previous value. Health events fully
// replace the node's latest probe record. Events for unknown nodes leave
// the state untouched, including pointer identity, so downstream change
// detection sees nothing.

use std::collections::HashMap;
use std::sync::Arc;

use gatewatch_api::ws::{NodeEvent, WsMessage};

use crate::model::{HealthCheckRecord, MonitorDashboard, MonitorNode, NodeStatus};

/// Immutable dashboard state: the node snapshot plus the latest health
/// probe per node.
///
/// Cloning is cheap (two `Arc` bumps). Each `apply` produces a new state
/// sharing every untouched node with its predecessor.
#[derive(Debug, Clone)]
pub struct DashboardState {
    dashboard: Arc<MonitorDashboard>,
    health: Arc<HashMap<String, Arc<HealthCheckRecord>>>,
}

impl DashboardState {
    pub fn new(dashboard: Arc<MonitorDashboard>) -> Self {
        Self {
            dashboard,
            health: Arc::new(HashMap::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Arc::new(MonitorDashboard::empty()))
    }

    pub fn dashboard(&self) -> &Arc<MonitorDashboard> {
        &self.dashboard
    }

    pub fn health(&self) -> &Arc<HashMap<String, Arc<HealthCheckRecord>>> {
        &self.health
    }

    /// Latest health probe for a node, if one has arrived this session.
    pub fn latest_health(&self, node_id: &str) -> Option<&Arc<HealthCheckRecord>> {
        self.health.get(node_id)
    }

    /// Replace the dashboard snapshot (fresh REST hydration), keeping
    /// accumulated health records.
    pub fn with_dashboard(&self, dashboard: Arc<MonitorDashboard>) -> Self {
        Self {
            dashboard,
            health: Arc::clone(&self.health),
        }
    }

    /// Apply one live event, returning the next state.
    ///
    /// Events naming a node not present in the dashboard return a state
    /// identical to `self` -- same `Arc`s, no observable change.
    pub fn apply(&self, msg: &WsMessage) -> Self {
        match msg {
            WsMessage::NodeStatus(event) | WsMessage::NodeMetrics(event) => {
                self.patch_node(event)
            }
            WsMessage::HealthCheck(event) => {
                let record = HealthCheckRecord::from(event.clone());
                let mut health = HashMap::clone(&self.health);
                health.insert(record.node_id.clone(), Arc::new(record));
                Self {
                    dashboard: Arc::clone(&self.dashboard),
                    health: Arc::new(health),
                }
            }
        }
    }

    /// Merge a sparse node patch into the snapshot.
    fn patch_node(&self, event: &NodeEvent) -> Self {
        let Some(index) = self.dashboard.nodes.iter().position(|n| n.id == event.node_id)
        else {
            tracing::debug!(node_id = %event.node_id, "event for unknown node, dropped");
            return self.clone();
        };

        let prev = &self.dashboard.nodes[index];
        let patched = patch(prev, event);

        let mut nodes = self.dashboard.nodes.clone();
        nodes[index] = Arc::new(patched);

        let dashboard = MonitorDashboard {
            account_id: self.dashboard.account_id.clone(),
            account_name: self.dashboard.account_name.clone(),
            nodes,
            updated_at: event
                .timestamp
                .clone()
                .unwrap_or_else(|| self.dashboard.updated_at.clone()),
        };

        Self {
            dashboard: Arc::new(dashboard),
            health: Arc::clone(&self.health),
        }
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::empty()
    }
}

/// Build the patched node: present fields override, absent fields carry
/// over. An unrecognized status string also carries the previous status.
fn patch(prev: &MonitorNode, event: &NodeEvent) -> MonitorNode {
    MonitorNode {
        id: prev.id.clone(),
        name: event.node_name.clone().unwrap_or_else(|| prev.name.clone()),
        url: prev.url.clone(),
        status: event
            .status
            .as_deref()
            .and_then(NodeStatus::from_wire)
            .unwrap_or(prev.status),
        weight: prev.weight,
        is_active: prev.is_active,
        disabled: prev.disabled,
        success_rate: event.success_rate.unwrap_or(prev.success_rate),
        avg_response_time: event.avg_response_time.unwrap_or(prev.avg_response_time),
        last_check_at: event
            .timestamp
            .clone()
            .or_else(|| prev.last_check_at.clone()),
        last_error: event
            .error
            .clone()
            .unwrap_or_else(|| prev.last_error.clone()),
        last_ping_ms: event.last_ping_ms.or(prev.last_ping_ms),
        trend_24h: prev.trend_24h.clone(),
        total_requests: event.total_requests.unwrap_or(prev.total_requests),
        failed_requests: event.failed_requests.unwrap_or(prev.failed_requests),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gatewatch_api::ws::HealthCheckEvent;
    use pretty_assertions::assert_eq;

    use super::*;

    fn node(id: &str) -> Arc<MonitorNode> {
        Arc::new(MonitorNode {
            id: id.into(),
            name: format!("node-{id}"),
            url: format!("https://{id}.example.com"),
            status: NodeStatus::Online,
            weight: 1,
            is_active: true,
            disabled: false,
            success_rate: 99.0,
            avg_response_time: 400,
            last_check_at: Some("2026-03-01T11:00:00Z".into()),
            last_error: String::new(),
            last_ping_ms: Some(30),
            trend_24h: Vec::new(),
            total_requests: 1000,
            failed_requests: 10,
        })
    }

    fn state() -> DashboardState {
        DashboardState::new(Arc::new(MonitorDashboard {
            account_id: "acct-1".into(),
            account_name: "Primary".into(),
            nodes: vec![node("n1"), node("n2")],
            updated_at: "2026-03-01T11:00:00Z".into(),
        }))
    }

    fn status_event(node_id: &str) -> NodeEvent {
        NodeEvent {
            node_id: node_id.into(),
            node_name: None,
            status: None,
            error: None,
            success_rate: None,
            avg_response_time: None,
            total_requests: None,
            failed_requests: None,
            last_ping_ms: None,
            timestamp: None,
        }
    }

    #[test]
    fn sparse_patch_merges_only_present_fields() {
        let prev = state();
        let event = NodeEvent {
            status: Some("offline".into()),
            error: Some("connect timeout".into()),
            timestamp: Some("2026-03-01T12:00:00Z".into()),
            ..status_event("n1")
        };

        let next = prev.apply(&WsMessage::NodeStatus(event));
        let n1 = next.dashboard().node("n1").unwrap();

        assert_eq!(n1.status, NodeStatus::Offline);
        assert_eq!(n1.last_error, "connect timeout");
        assert_eq!(n1.last_check_at.as_deref(), Some("2026-03-01T12:00:00Z"));
        // Absent fields carry over untouched
        assert_eq!(n1.success_rate, 99.0);
        assert_eq!(n1.avg_response_time, 400);
        assert_eq!(n1.total_requests, 1000);
        assert_eq!(n1.last_ping_ms, Some(30));
        // Dashboard timestamp follows the event
        assert_eq!(next.dashboard().updated_at, "2026-03-01T12:00:00Z");
    }

    #[test]
    fn metrics_patch_preserves_status() {
        let prev = state();
        let event = NodeEvent {
            success_rate: Some(97.5),
            avg_response_time: Some(420),
            total_requests: Some(1100),
            failed_requests: Some(25),
            ..status_event("n1")
        };

        let next = prev.apply(&WsMessage::NodeMetrics(event));
        let n1 = next.dashboard().node("n1").unwrap();

        assert_eq!(n1.status, NodeStatus::Online);
        assert_eq!(n1.success_rate, 97.5);
        assert_eq!(n1.total_requests, 1100);
    }

    #[test]
    fn unknown_node_is_identity() {
        let prev = state();
        let next = prev.apply(&WsMessage::NodeStatus(status_event("ghost")));

        assert!(Arc::ptr_eq(prev.dashboard(), next.dashboard()));
        assert!(Arc::ptr_eq(prev.health(), next.health()));
    }

    #[test]
    fn unrecognized_status_string_keeps_previous() {
        let prev = state();
        let event = NodeEvent {
            status: Some("degraded".into()),
            ..status_event("n1")
        };

        let next = prev.apply(&WsMessage::NodeStatus(event));
        assert_eq!(next.dashboard().node("n1").unwrap().status, NodeStatus::Online);
    }

    #[test]
    fn untouched_nodes_keep_pointer_identity() {
        let prev = state();
        let event = NodeEvent {
            status: Some("offline".into()),
            ..status_event("n1")
        };

        let next = prev.apply(&WsMessage::NodeStatus(event));

        let prev_n2 = prev.dashboard().node("n2").unwrap();
        let next_n2 = next.dashboard().node("n2").unwrap();
        assert!(Arc::ptr_eq(prev_n2, next_n2));

        let prev_n1 = prev.dashboard().node("n1").unwrap();
        let next_n1 = next.dashboard().node("n1").unwrap();
        assert!(!Arc::ptr_eq(prev_n1, next_n1));

        // Health map is untouched by node patches
        assert!(Arc::ptr_eq(prev.health(), next.health()));
    }

    #[test]
    fn health_check_fully_replaces_previous_record() {
        let prev = state();

        let first = prev.apply(&WsMessage::HealthCheck(HealthCheckEvent {
            node_id: "n1".into(),
            check_time: "2026-03-01T12:00:00Z".into(),
            success: false,
            response_time_ms: 900,
            error_message: "upstream 502".into(),
            check_method: "api".into(),
        }));

        let second = first.apply(&WsMessage::HealthCheck(HealthCheckEvent {
            node_id: "n1".into(),
            check_time: "2026-03-01T12:00:30Z".into(),
            success: true,
            response_time_ms: 0,
            error_message: String::new(),
            check_method: "api".into(),
        }));

        let record = second.latest_health("n1").unwrap();
        assert!(record.success);
        assert_eq!(record.check_time, "2026-03-01T12:00:30Z");
        // Nothing from the failed probe leaks through
        assert_eq!(record.error_message, "");
        assert_eq!(record.response_time_ms, 0);

        // Health events leave the dashboard untouched
        assert!(Arc::ptr_eq(prev.dashboard(), second.dashboard()));
    }

    #[test]
    fn hydration_keeps_health_records() {
        let prev = state().apply(&WsMessage::HealthCheck(HealthCheckEvent {
            node_id: "n2".into(),
            check_time: "2026-03-01T12:00:00Z".into(),
            success: true,
            response_time_ms: 120,
            error_message: String::new(),
            check_method: "ping".into(),
        }));

        let fresh = Arc::new(MonitorDashboard {
            account_id: "acct-1".into(),
            account_name: "Primary".into(),
            nodes: vec![node("n1")],
            updated_at: "2026-03-01T12:05:00Z".into(),
        });
        let next = prev.with_dashboard(Arc::clone(&fresh));

        assert!(Arc::ptr_eq(next.dashboard(), &fresh));
        assert!(next.latest_health("n2").is_some());
    }

    #[test]
    fn missing_timestamp_keeps_dashboard_and_node_timestamps() {
        let prev = state();
        let event = NodeEvent {
            success_rate: Some(95.0),
            ..status_event("n1")
        };

        let next = prev.apply(&WsMessage::NodeMetrics(event));

        assert_eq!(next.dashboard().updated_at, "2026-03-01T11:00:00Z");
        assert_eq!(
            next.dashboard().node("n1").unwrap().last_check_at.as_deref(),
            Some("2026-03-01T11:00:00Z")
        );
    }
}
