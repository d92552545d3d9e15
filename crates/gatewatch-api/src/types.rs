// Wire DTOs for the gateway REST API.
//
// Field names match the gateway's JSON exactly. Everything beyond the
// identifiers is optional or defaulted -- the gateway omits fields freely
// and the client must tolerate partial payloads.

use serde::{Deserialize, Serialize};

// ── Dashboard ───────────────────────────────────────────────────────

/// `GET /api/monitor/dashboard` response: the full dashboard snapshot
/// used to hydrate the store before the live stream takes over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub account_id: String,
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub nodes: Vec<NodeDto>,
    #[serde(default)]
    pub updated_at: String,
}

/// One monitored upstream node as the gateway reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDto {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub weight: i64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub success_rate: f64,
    #[serde(default)]
    pub avg_response_time: i64,
    #[serde(default)]
    pub last_check_at: Option<String>,
    #[serde(default)]
    pub last_error: String,
    #[serde(default)]
    pub last_ping_ms: Option<i64>,
    #[serde(default)]
    pub trend_24h: Vec<TrendPointDto>,
    #[serde(default)]
    pub total_requests: i64,
    #[serde(default)]
    pub failed_requests: i64,
}

/// One point of a node's 24-hour success-rate/latency trend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendPointDto {
    pub timestamp: String,
    #[serde(default)]
    pub success_rate: f64,
    #[serde(default)]
    pub avg_time: i64,
}

// ── Monitor shares ──────────────────────────────────────────────────

/// `POST /api/monitor/shares` request body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateShareRequest {
    /// Target account (admins may share another account's dashboard).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// One of `"1h"`, `"24h"`, `"168h"`, `"permanent"`.
    pub expire_in: String,
}

/// A monitor share: read-only dashboard access via token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareDto {
    pub id: String,
    #[serde(default)]
    pub account_id: Option<String>,
    pub token: String,
    #[serde(default)]
    pub share_url: Option<String>,
    #[serde(default)]
    pub expire_at: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub revoked: bool,
    #[serde(default)]
    pub revoked_at: Option<String>,
}

// ── Health history ──────────────────────────────────────────────────

/// Query parameters for `GET /api/nodes/{id}/health-history`.
#[derive(Debug, Clone, Default)]
pub struct HealthHistoryQuery {
    /// Range start, RFC3339. Gateway default: 24h before `to`.
    pub from: Option<String>,
    /// Range end, RFC3339. Gateway default: now.
    pub to: Option<String>,
    /// Max records (gateway default 300, cap 2000).
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// `GET /api/nodes/{id}/health-history` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthHistoryResponse {
    pub node_id: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub checks: Vec<HealthCheckDto>,
}

/// One historical health probe result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckDto {
    #[serde(default)]
    pub check_time: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub response_time_ms: i64,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub check_method: String,
}

// ── Error body ──────────────────────────────────────────────────────

/// Gateway error responses: `{"error": "..."}`, sometimes with a code.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
