// Gateway REST client
//
// Wraps `reqwest::Client` with gateway-specific URL construction, bearer
// auth, and error-body decoding. Endpoints: dashboard hydration, monitor
// shares, and per-node health history.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{
    ApiErrorBody, CreateShareRequest, DashboardResponse, HealthHistoryQuery,
    HealthHistoryResponse, ShareDto,
};

/// HTTP client for the gateway monitor API.
///
/// Authenticated requests carry the account API key as a bearer token.
/// Share-token access paths skip auth entirely -- the token rides in the
/// URL, mirroring the read-only monitor page.
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<SecretString>,
}

impl GatewayClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the gateway root (e.g. `https://gateway.example.com`).
    /// `api_key` is required for authenticated endpoints; pass `None` when
    /// only share-token access is used.
    pub fn new(
        base_url: Url,
        api_key: Option<SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    /// Create a client with a pre-built `reqwest::Client` (tests).
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        api_key: Option<SecretString>,
    ) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    /// The gateway base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an API path under the gateway root.
    pub(crate) fn api_url(&self, path: &str) -> Url {
        let base = self.base_url.as_str().trim_end_matches('/');
        let full = format!("{base}/api/{path}");
        Url::parse(&full).unwrap_or_else(|_| self.base_url.clone())
    }

    /// Build the WebSocket endpoint URL for the live monitor stream.
    ///
    /// Upgrades the gateway scheme to its WebSocket variant (`http` → `ws`,
    /// `https` → `wss`) and appends `account_id` / `token` query parameters
    /// when given. The share token grants read-only access without an API key.
    pub fn ws_url(
        &self,
        account_id: Option<&str>,
        share_token: Option<&str>,
    ) -> Result<Url, Error> {
        let mut url = self.api_url("monitor/ws");
        let scheme = match url.scheme() {
            "https" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|()| Error::WebSocketConnect(format!("cannot set scheme on {url}")))?;

        {
            let mut pairs = url.query_pairs_mut();
            if let Some(aid) = account_id {
                pairs.append_pair("account_id", aid);
            }
            if let Some(token) = share_token {
                pairs.append_pair("token", token);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    // ── Dashboard ────────────────────────────────────────────────────

    /// Fetch the full dashboard snapshot for the authenticated account.
    ///
    /// Admins may pass `account_id` to view another account's dashboard.
    pub async fn get_dashboard(
        &self,
        account_id: Option<&str>,
    ) -> Result<DashboardResponse, Error> {
        let mut url = self.api_url("monitor/dashboard");
        if let Some(aid) = account_id {
            url.query_pairs_mut().append_pair("account_id", aid);
        }
        self.get(url).await
    }

    /// Fetch a dashboard snapshot through a share token (no API key).
    pub async fn get_shared_dashboard(&self, token: &str) -> Result<DashboardResponse, Error> {
        let url = self.api_url(&format!("monitor/shared/{token}"));
        match self.get::<DashboardResponse>(url).await {
            Err(Error::Api { status, .. }) if status == 404 || status == 401 => {
                Err(Error::ShareExpired)
            }
            other => other,
        }
    }

    // ── Monitor shares ───────────────────────────────────────────────

    /// Create a read-only monitor share.
    pub async fn create_share(&self, req: &CreateShareRequest) -> Result<ShareDto, Error> {
        let url = self.api_url("monitor/shares");
        self.post(url, req).await
    }

    /// List the account's monitor shares.
    pub async fn list_shares(&self) -> Result<Vec<ShareDto>, Error> {
        let url = self.api_url("monitor/shares");
        self.get(url).await
    }

    /// Revoke a monitor share by id.
    pub async fn revoke_share(&self, share_id: &str) -> Result<(), Error> {
        let url = self.api_url(&format!("monitor/shares/{share_id}"));
        debug!("DELETE {}", url);
        let resp = self
            .apply_auth(self.http.delete(url))
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::check_status(resp).await?;
        Ok(())
    }

    // ── Health history ───────────────────────────────────────────────

    /// Fetch historical health-check records for one node.
    ///
    /// `share_token` enables unauthenticated access for nodes covered by
    /// a share.
    pub async fn get_health_history(
        &self,
        node_id: &str,
        query: &HealthHistoryQuery,
        share_token: Option<&str>,
    ) -> Result<HealthHistoryResponse, Error> {
        let mut url = self.api_url(&format!("nodes/{node_id}/health-history"));
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(ref from) = query.from {
                pairs.append_pair("from", from);
            }
            if let Some(ref to) = query.to {
                pairs.append_pair("to", to);
            }
            if let Some(limit) = query.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
            if let Some(offset) = query.offset {
                pairs.append_pair("offset", &offset.to_string());
            }
            if let Some(token) = share_token {
                pairs.append_pair("share_token", token);
            }
        }
        self.get(url).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn apply_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.api_key.as_ref() {
            Some(key) => builder.bearer_auth(key.expose_secret()),
            None => builder,
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self
            .apply_auth(self.http.get(url))
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::parse_body(resp).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", url);
        let resp = self
            .apply_auth(self.http.post(url).json(body))
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::parse_body(resp).await
    }

    /// Check the response status, decoding the gateway's `{"error": ...}`
    /// body into a structured error.
    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let parsed: Option<ApiErrorBody> = serde_json::from_str(&body).ok();
        let message = parsed
            .as_ref()
            .and_then(|e| e.error.clone().or_else(|| e.message.clone()))
            .unwrap_or_else(|| format!("HTTP {status}: {}", preview(&body)));

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication { message });
        }

        Err(Error::Api {
            message,
            code: parsed.and_then(|e| e.code),
            status: status.as_u16(),
        })
    }

    async fn parse_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let resp = Self::check_status(resp).await?;
        let body = resp.text().await.map_err(Error::Transport)?;

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })
    }
}

/// Truncate a response body for error messages without splitting a
/// multi-byte UTF-8 character. Gateway error bodies are not ASCII-only.
fn preview(body: &str) -> &str {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body;
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> GatewayClient {
        GatewayClient::with_client(reqwest::Client::new(), Url::parse(base).unwrap(), None)
    }

    #[test]
    fn ws_url_upgrades_https_to_wss() {
        let c = client("https://gw.example.com");
        let url = c.ws_url(None, None).unwrap();
        assert_eq!(url.as_str(), "wss://gw.example.com/api/monitor/ws");
    }

    #[test]
    fn ws_url_upgrades_http_to_ws() {
        let c = client("http://127.0.0.1:8080");
        let url = c.ws_url(None, None).unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:8080/api/monitor/ws");
    }

    #[test]
    fn ws_url_carries_account_scope() {
        let c = client("https://gw.example.com");
        let url = c.ws_url(Some("acct-1"), None).unwrap();
        assert_eq!(
            url.as_str(),
            "wss://gw.example.com/api/monitor/ws?account_id=acct-1"
        );
    }

    #[test]
    fn ws_url_carries_share_token() {
        let c = client("https://gw.example.com");
        let url = c.ws_url(None, Some("tok123")).unwrap();
        assert_eq!(url.as_str(), "wss://gw.example.com/api/monitor/ws?token=tok123");
    }

    #[test]
    fn preview_respects_char_boundaries() {
        // Byte 200 lands inside the first multi-byte character
        let body = format!("{}上游节点不可用", "x".repeat(199));
        let p = preview(&body);
        assert!(p.len() <= 200);
        assert!(p.ends_with('x'), "truncation must back up to a boundary");

        let short = "节点离线";
        assert_eq!(preview(short), short);
    }

    #[test]
    fn api_url_tolerates_trailing_slash() {
        let c = client("https://gw.example.com/");
        assert_eq!(
            c.api_url("monitor/dashboard").as_str(),
            "https://gw.example.com/api/monitor/dashboard"
        );
    }
}
