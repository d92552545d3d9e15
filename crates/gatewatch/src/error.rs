//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use gatewatch_core::CoreError;

/// Exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to gateway at {url}")]
    #[diagnostic(
        code(gatewatch::connection_failed),
        help(
            "Check that the gateway is running and accessible.\n\
             URL: {url}\n\
             Try: gatewatch status --insecure"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(gatewatch::auth_failed),
        help(
            "Verify your API key.\n\
             Check the API Keys page on your gateway, or set GATEWATCH_API_KEY."
        )
    )]
    AuthFailed { profile: String },

    #[error("Share link invalid or expired")]
    #[diagnostic(
        code(gatewatch::share_expired),
        help("Ask the dashboard owner for a fresh share link, or use an API key.")
    )]
    ShareExpired,

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(gatewatch::no_credentials),
        help(
            "Configure credentials with: gatewatch config init\n\
             Or set the GATEWATCH_API_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(gatewatch::not_found),
        help("Run: gatewatch {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Gateway API error ({code}): {message}")]
    #[diagnostic(code(gatewatch::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(gatewatch::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(gatewatch::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: gatewatch config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(gatewatch::no_config),
        help(
            "Create one with: gatewatch config init --gateway <URL>\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(gatewatch::config))]
    Config(#[from] gatewatch_config::ConfigError),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(gatewatch::timeout),
        help("Increase timeout with --timeout or check gateway responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(gatewatch::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::ShareExpired | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::AuthenticationFailed { message: _ } => CliError::AuthFailed {
                profile: "current".into(),
            },

            CoreError::ShareExpired => CliError::ShareExpired,

            CoreError::Disconnected => CliError::ConnectionFailed {
                url: "(disconnected)".into(),
                source: "Gateway connection was lost".into(),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::NodeNotFound { identifier } => CliError::NotFound {
                resource_type: "node".into(),
                identifier,
                list_command: "status".into(),
            },

            CoreError::ShareNotFound { identifier } => CliError::NotFound {
                resource_type: "share".into(),
                identifier,
                list_command: "share list".into(),
            },

            CoreError::Api {
                message,
                code,
                status: _,
            } => CliError::ApiError {
                code: code.unwrap_or_default(),
                message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}
