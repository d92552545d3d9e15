// ── Domain model ──
//
// Monitor entities as consumers see them: typed, defaulted, and wrapped
// in `Arc` for cheap sharing across snapshots. Wire-level optionality
// lives in gatewatch-api's DTOs; by the time data reaches these types
// every field has a value.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ── Node status ─────────────────────────────────────────────────────

/// Operational status of a monitored node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Online,
    #[default]
    Offline,
    /// A health probe is in flight; the previous status is stale.
    Checking,
    /// Administratively disabled; the gateway skips probing it.
    Disabled,
}

impl NodeStatus {
    /// Parse a wire status string. Unknown values yield `None` so callers
    /// can keep the previous status instead of guessing.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "online" => Some(Self::Online),
            "offline" => Some(Self::Offline),
            "checking" => Some(Self::Checking),
            "disabled" => Some(Self::Disabled),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Checking => "checking",
            Self::Disabled => "disabled",
        }
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── MonitorNode ─────────────────────────────────────────────────────

/// One monitored upstream node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorNode {
    pub id: String,
    pub name: String,
    pub url: String,
    pub status: NodeStatus,
    pub weight: i64,
    pub is_active: bool,
    pub disabled: bool,
    /// Rolling success rate, percent (0.0 - 100.0).
    pub success_rate: f64,
    /// Rolling average response time, milliseconds.
    pub avg_response_time: i64,
    /// When the node was last probed, ISO-8601. `None` if never probed.
    pub last_check_at: Option<String>,
    /// Last probe error, empty when healthy.
    pub last_error: String,
    pub last_ping_ms: Option<i64>,
    pub trend_24h: Vec<TrendPoint>,
    pub total_requests: i64,
    pub failed_requests: i64,
}

impl MonitorNode {
    /// Effective status: a disabled node reads as disabled regardless of
    /// what the last probe said.
    pub fn resolved_status(&self) -> NodeStatus {
        if self.disabled {
            NodeStatus::Disabled
        } else {
            self.status
        }
    }

    /// Failed requests as a fraction of total, percent.
    pub fn failure_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let rate = self.failed_requests as f64 / self.total_requests as f64;
            rate * 100.0
        }
    }
}

/// One point of a node's 24-hour success-rate/latency trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub timestamp: String,
    pub success_rate: f64,
    pub avg_time: i64,
}

// ── MonitorDashboard ────────────────────────────────────────────────

/// Full dashboard snapshot for one account.
///
/// Nodes are individually `Arc`-wrapped: a live update that touches one
/// node replaces only that entry, so untouched nodes keep pointer
/// identity across snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorDashboard {
    pub account_id: String,
    pub account_name: String,
    pub nodes: Vec<Arc<MonitorNode>>,
    /// When the dashboard last changed, ISO-8601.
    pub updated_at: String,
}

impl MonitorDashboard {
    pub fn empty() -> Self {
        Self {
            account_id: String::new(),
            account_name: String::new(),
            nodes: Vec::new(),
            updated_at: String::new(),
        }
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&Arc<MonitorNode>> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Count of nodes whose effective status matches.
    pub fn count_by_status(&self, status: NodeStatus) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.resolved_status() == status)
            .count()
    }
}

// ── HealthCheckRecord ───────────────────────────────────────────────

/// The most recent health probe result for one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckRecord {
    pub node_id: String,
    pub check_time: String,
    pub success: bool,
    pub response_time_ms: i64,
    /// Empty when the probe succeeded.
    pub error_message: String,
    /// Probe method, e.g. `"api"` or `"ping"`.
    pub check_method: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn node(id: &str) -> MonitorNode {
        MonitorNode {
            id: id.into(),
            name: format!("node-{id}"),
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
        }
    }

    #[test]
    fn disabled_overrides_probe_status() {
        let mut n = node("n1");
        n.status = NodeStatus::Online;
        n.disabled = true;
        assert_eq!(n.resolved_status(), NodeStatus::Disabled);
    }

    #[test]
    fn unknown_wire_status_is_none() {
        assert_eq!(NodeStatus::from_wire("online"), Some(NodeStatus::Online));
        assert_eq!(NodeStatus::from_wire("degraded"), None);
        assert_eq!(NodeStatus::from_wire(""), None);
    }

    #[test]
    fn failure_rate_handles_zero_requests() {
        let mut n = node("n1");
        assert_eq!(n.failure_rate(), 0.0);
        n.total_requests = 200;
        n.failed_requests = 50;
        assert!((n.failure_rate() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn dashboard_counts_by_effective_status() {
        let mut offline = node("n2");
        offline.status = NodeStatus::Offline;
        let mut disabled = node("n3");
        disabled.disabled = true;

        let dash = MonitorDashboard {
            account_id: "a1".into(),
            account_name: String::new(),
            nodes: vec![
                Arc::new(node("n1")),
                Arc::new(offline),
                Arc::new(disabled),
            ],
            updated_at: String::new(),
        };

        assert_eq!(dash.count_by_status(NodeStatus::Online), 1);
        assert_eq!(dash.count_by_status(NodeStatus::Offline), 1);
        assert_eq!(dash.count_by_status(NodeStatus::Disabled), 1);
        assert!(dash.node("n2").is_some());
        assert!(dash.node("missing").is_none());
    }
}
