// ── Runtime connection configuration ──
//
// These types describe *how* to connect to a gateway's monitor API.
// They carry credential data and connection tuning, but never touch disk.
// The CLI constructs a `MonitorConfig` and hands it in.

use std::time::Duration;

use gatewatch_api::ws::ReconnectConfig;
use secrecy::SecretString;
use url::Url;

/// How to authenticate with a gateway.
#[derive(Debug, Clone)]
pub enum MonitorAuth {
    /// Account API key (full access: dashboard, shares, history).
    ApiKey(SecretString),
    /// Read-only share token (dashboard and history for shared nodes only).
    ShareToken(String),
}

impl MonitorAuth {
    /// Returns `true` for share-token (read-only) access.
    pub fn is_share(&self) -> bool {
        matches!(self, Self::ShareToken(_))
    }
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default)]
pub enum TlsVerification {
    /// System CA store (strict). Default for public gateways.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-hosted gateways with self-signed certs).
    DangerAcceptInvalid,
}

impl PartialEq for TlsVerification {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::SystemDefaults, Self::SystemDefaults)
            | (Self::DangerAcceptInvalid, Self::DangerAcceptInvalid) => true,
            (Self::CustomCa(a), Self::CustomCa(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for TlsVerification {}

/// Configuration for connecting to a single gateway monitor.
///
/// Built by the CLI, passed to `Monitor` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Gateway URL (e.g., `https://gateway.example.com`).
    pub gateway: Url,
    /// Authentication method and credentials.
    pub auth: MonitorAuth,
    /// Account to monitor (admins may target another account).
    pub account_id: Option<String>,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout for REST calls.
    pub timeout: Duration,
    /// WebSocket reconnection tuning.
    pub reconnect: ReconnectConfig,
    /// Minimum interval between published state updates. Events arriving
    /// faster than this are coalesced into a single update.
    pub frame_interval: Duration,
    /// Enable the live WebSocket stream. Off for one-shot CLI commands.
    pub live_updates: bool,
}

impl MonitorConfig {
    /// Create a config with default tuning for the given gateway and auth.
    pub fn new(gateway: Url, auth: MonitorAuth) -> Self {
        Self {
            gateway,
            auth,
            account_id: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            reconnect: ReconnectConfig::default(),
            frame_interval: Duration::from_millis(16),
            live_updates: true,
        }
    }
}
