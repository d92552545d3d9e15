// ── DTO → domain conversions ──
//
// Wire types from gatewatch-api become domain types here. Unknown status
// strings collapse to `Offline` on full snapshots (the gateway is
// authoritative there); live patches handle unknowns separately by
// keeping the previous status.

use std::sync::Arc;

use gatewatch_api::types::{DashboardResponse, HealthCheckDto, NodeDto, TrendPointDto};
use gatewatch_api::ws::HealthCheckEvent;

use crate::model::{HealthCheckRecord, MonitorDashboard, MonitorNode, NodeStatus, TrendPoint};

impl From<TrendPointDto> for TrendPoint {
    fn from(dto: TrendPointDto) -> Self {
        Self {
            timestamp: dto.timestamp,
            success_rate: dto.success_rate,
            avg_time: dto.avg_time,
        }
    }
}

impl From<NodeDto> for MonitorNode {
    fn from(dto: NodeDto) -> Self {
        Self {
            status: NodeStatus::from_wire(&dto.status).unwrap_or_default(),
            id: dto.id,
            name: dto.name,
            url: dto.url,
            weight: dto.weight,
            is_active: dto.is_active,
            disabled: dto.disabled,
            success_rate: dto.success_rate,
            avg_response_time: dto.avg_response_time,
            last_check_at: dto.last_check_at,
            last_error: dto.last_error,
            last_ping_ms: dto.last_ping_ms,
            trend_24h: dto.trend_24h.into_iter().map(TrendPoint::from).collect(),
            total_requests: dto.total_requests,
            failed_requests: dto.failed_requests,
        }
    }
}

impl From<DashboardResponse> for MonitorDashboard {
    fn from(dto: DashboardResponse) -> Self {
        Self {
            account_id: dto.account_id,
            account_name: dto.account_name,
            nodes: dto
                .nodes
                .into_iter()
                .map(|n| Arc::new(MonitorNode::from(n)))
                .collect(),
            updated_at: dto.updated_at,
        }
    }
}

impl From<HealthCheckEvent> for HealthCheckRecord {
    fn from(event: HealthCheckEvent) -> Self {
        Self {
            node_id: event.node_id,
            check_time: event.check_time,
            success: event.success,
            response_time_ms: event.response_time_ms,
            error_message: event.error_message,
            check_method: event.check_method,
        }
    }
}

impl HealthCheckRecord {
    /// Build a record from a history DTO, which carries no node id of
    /// its own.
    pub fn from_dto(node_id: &str, dto: HealthCheckDto) -> Self {
        Self {
            node_id: node_id.into(),
            check_time: dto.check_time,
            success: dto.success,
            response_time_ms: dto.response_time_ms,
            error_message: dto.error_message,
            check_method: if dto.check_method.is_empty() {
                "api".into()
            } else {
                dto.check_method
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn node_dto_with_unknown_status_defaults_to_offline() {
        let dto = NodeDto {
            id: "n1".into(),
            name: "relay".into(),
            url: String::new(),
            status: "degraded".into(),
            weight: 0,
            is_active: false,
            disabled: false,
            success_rate: 0.0,
            avg_response_time: 0,
            last_check_at: None,
            last_error: String::new(),
            last_ping_ms: None,
            trend_24h: Vec::new(),
            total_requests: 0,
            failed_requests: 0,
        };

        let node = MonitorNode::from(dto);
        assert_eq!(node.status, NodeStatus::Offline);
    }

    #[test]
    fn history_dto_defaults_check_method() {
        let dto = HealthCheckDto {
            check_time: "2026-03-01T12:00:00Z".into(),
            success: true,
            response_time_ms: 88,
            error_message: String::new(),
            check_method: String::new(),
        };

        let record = HealthCheckRecord::from_dto("n1", dto);
        assert_eq!(record.node_id, "n1");
        assert_eq!(record.check_method, "api");
    }
}
