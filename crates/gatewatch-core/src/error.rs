// ── Core error types ──
//
// User-facing errors from gatewatch-core. These are NOT API-specific --
// consumers never see HTTP status codes or JSON parse failures directly.
// The `From<gatewatch_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to gateway at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Share link invalid or expired")]
    ShareExpired,

    #[error("Monitor disconnected")]
    Disconnected,

    #[error("Gateway request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Node not found: {identifier}")]
    NodeNotFound { identifier: String },

    #[error("Share not found: {identifier}")]
    ShareNotFound { identifier: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("Gateway API error: {message}")]
    Api {
        message: String,
        code: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<gatewatch_api::Error> for CoreError {
    fn from(err: gatewatch_api::Error) -> Self {
        match err {
            gatewatch_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            gatewatch_api::Error::ShareExpired => CoreError::ShareExpired,
            gatewatch_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            gatewatch_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            gatewatch_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            gatewatch_api::Error::Api {
                message,
                code,
                status,
            } => CoreError::Api {
                message,
                code,
                status: Some(status),
            },
            gatewatch_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            gatewatch_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
