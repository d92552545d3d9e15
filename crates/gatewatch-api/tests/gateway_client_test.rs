#![allow(clippy::unwrap_used)]
// Integration tests for `GatewayClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gatewatch_api::types::{CreateShareRequest, HealthHistoryQuery};
use gatewatch_api::{Error, GatewayClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, GatewayClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = GatewayClient::with_client(
        reqwest::Client::new(),
        base_url,
        Some("test-api-key".to_string().into()),
    );
    (server, client)
}

fn dashboard_body() -> serde_json::Value {
    json!({
        "account_id": "acct-1",
        "account_name": "Primary",
        "updated_at": "2026-03-01T12:00:00Z",
        "nodes": [
            {
                "id": "n1",
                "name": "relay-east",
                "url": "https://relay-east.example.com",
                "status": "online",
                "weight": 10,
                "is_active": true,
                "disabled": false,
                "success_rate": 99.2,
                "avg_response_time": 412,
                "last_check_at": "2026-03-01T11:59:30Z",
                "last_error": "",
                "last_ping_ms": 38,
                "total_requests": 15023,
                "failed_requests": 120,
                "trend_24h": [
                    { "timestamp": "2026-03-01T11:00:00Z", "success_rate": 98.7, "avg_time": 430 }
                ]
            },
            {
                "id": "n2",
                "name": "relay-west",
                "status": "offline",
                "last_error": "connect timeout"
            }
        ]
    })
}

// ── Dashboard tests ─────────────────────────────────────────────────

#[tokio::test]
async fn test_get_dashboard() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/monitor/dashboard"))
        .and(header("authorization", "Bearer test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(dashboard_body()))
        .mount(&server)
        .await;

    let dashboard = client.get_dashboard(None).await.unwrap();

    assert_eq!(dashboard.account_id, "acct-1");
    assert_eq!(dashboard.nodes.len(), 2);
    assert_eq!(dashboard.nodes[0].id, "n1");
    assert_eq!(dashboard.nodes[0].last_ping_ms, Some(38));
    assert_eq!(dashboard.nodes[0].trend_24h.len(), 1);
    // Missing fields on n2 take defaults
    assert_eq!(dashboard.nodes[1].success_rate, 0.0);
    assert!(dashboard.nodes[1].last_ping_ms.is_none());
    assert_eq!(dashboard.nodes[1].last_error, "connect timeout");
}

#[tokio::test]
async fn test_get_dashboard_for_other_account() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/monitor/dashboard"))
        .and(query_param("account_id", "acct-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(dashboard_body()))
        .mount(&server)
        .await;

    client.get_dashboard(Some("acct-2")).await.unwrap();
}

#[tokio::test]
async fn test_get_shared_dashboard() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/monitor/shared/tok-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(dashboard_body()))
        .mount(&server)
        .await;

    let dashboard = client.get_shared_dashboard("tok-abc").await.unwrap();
    assert_eq!(dashboard.account_id, "acct-1");
}

#[tokio::test]
async fn test_shared_dashboard_expired_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/monitor/shared/tok-dead"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "share not found" })),
        )
        .mount(&server)
        .await;

    let result = client.get_shared_dashboard("tok-dead").await;

    assert!(
        matches!(result, Err(Error::ShareExpired)),
        "expected ShareExpired, got: {result:?}"
    );
}

// ── Auth tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_maps_to_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/monitor/dashboard"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "invalid api key" })),
        )
        .mount(&server)
        .await;

    let result = client.get_dashboard(None).await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(
                message.contains("invalid api key"),
                "expected gateway message, got: {message}"
            );
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_api_error_carries_status_and_message() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/monitor/dashboard"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "database unavailable" })),
        )
        .mount(&server)
        .await;

    let result = client.get_dashboard(None).await;

    match result {
        Err(Error::Api {
            ref message,
            status,
            ..
        }) => {
            assert_eq!(status, 500);
            assert!(message.contains("database unavailable"));
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_error_body_with_multibyte_text() {
    let (server, client) = setup().await;

    // Byte 200 of the body falls inside a multi-byte character
    let body = format!("{}上游网关错误：节点不可用", "x".repeat(199));
    Mock::given(method("GET"))
        .and(path("/api/monitor/dashboard"))
        .respond_with(ResponseTemplate::new(500).set_body_string(body))
        .mount(&server)
        .await;

    let result = client.get_dashboard(None).await;

    match result {
        Err(Error::Api {
            ref message,
            status,
            ..
        }) => {
            assert_eq!(status, 500);
            assert!(message.contains("HTTP 500"));
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

// ── Share tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_share() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/monitor/shares"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "share-1",
            "token": "tok-xyz",
            "share_url": "https://gw.example.com/monitor/tok-xyz",
            "expire_at": "2026-03-02T12:00:00Z",
            "created_at": "2026-03-01T12:00:00Z",
            "revoked": false
        })))
        .mount(&server)
        .await;

    let share = client
        .create_share(&CreateShareRequest {
            account_id: None,
            expire_in: "24h".into(),
        })
        .await
        .unwrap();

    assert_eq!(share.id, "share-1");
    assert_eq!(share.token, "tok-xyz");
    assert!(!share.revoked);
}

#[tokio::test]
async fn test_list_shares() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/monitor/shares"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "share-1",
                "token": "tok-a",
                "created_at": "2026-02-28T00:00:00Z",
                "revoked": false
            },
            {
                "id": "share-2",
                "token": "tok-b",
                "created_at": "2026-02-27T00:00:00Z",
                "revoked": true,
                "revoked_at": "2026-02-28T09:00:00Z"
            }
        ])))
        .mount(&server)
        .await;

    let shares = client.list_shares().await.unwrap();

    assert_eq!(shares.len(), 2);
    assert!(!shares[0].revoked);
    assert!(shares[1].revoked);
    assert_eq!(shares[1].revoked_at.as_deref(), Some("2026-02-28T09:00:00Z"));
}

#[tokio::test]
async fn test_revoke_share() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/monitor/shares/share-1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    client.revoke_share("share-1").await.unwrap();
}

// ── Health history tests ────────────────────────────────────────────

#[tokio::test]
async fn test_get_health_history() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/nodes/n1/health-history"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "node_id": "n1",
            "from": "2026-02-28T12:00:00Z",
            "to": "2026-03-01T12:00:00Z",
            "total": 2,
            "checks": [
                {
                    "check_time": "2026-03-01T11:59:00Z",
                    "success": true,
                    "response_time_ms": 120,
                    "check_method": "api"
                },
                {
                    "check_time": "2026-03-01T11:58:00Z",
                    "success": false,
                    "error_message": "connect timeout"
                }
            ]
        })))
        .mount(&server)
        .await;

    let history = client
        .get_health_history(
            "n1",
            &HealthHistoryQuery {
                limit: Some(50),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    assert_eq!(history.node_id, "n1");
    assert_eq!(history.total, 2);
    assert_eq!(history.checks.len(), 2);
    assert!(history.checks[0].success);
    assert_eq!(history.checks[1].error_message, "connect timeout");
    assert_eq!(history.checks[1].response_time_ms, 0);
}

#[tokio::test]
async fn test_health_history_with_share_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/nodes/n1/health-history"))
        .and(query_param("share_token", "tok-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "node_id": "n1",
            "total": 0,
            "checks": []
        })))
        .mount(&server)
        .await;

    let history = client
        .get_health_history("n1", &HealthHistoryQuery::default(), Some("tok-abc"))
        .await
        .unwrap();

    assert!(history.checks.is_empty());
}
