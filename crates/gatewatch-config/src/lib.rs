//! Shared configuration for the gatewatch CLI.
//!
//! TOML profiles, credential resolution (env + plaintext), and
//! translation to `gatewatch_core::MonitorConfig`. The CLI adds
//! flag-aware overrides on top.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gatewatch_core::{MonitorAuth, MonitorConfig, TlsVerification};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named gateway profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name, or the default profile when `name` is
    /// `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .map(String::from)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into());

        match self.profiles.get_key_value(name.as_str()) {
            Some((key, profile)) => Ok((key.as_str(), profile)),
            None => Err(ConfigError::UnknownProfile { profile: name }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named gateway profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Gateway base URL (e.g., "https://gateway.example.com").
    pub gateway: String,

    /// Account to monitor (admins may target another account).
    pub account_id: Option<String>,

    /// API key (plaintext -- prefer env var via `api_key_env`).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Read-only share token (alternative to an API key).
    pub share_token: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "gatewatch", "gatewatch").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("gatewatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load a Config from a specific file path (plus environment overrides).
pub fn load_config_from(path: &std::path::Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("GATEWATCH_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

/// Serialize config to TOML and write to a specific path.
pub fn save_config_to(cfg: &Config, path: &std::path::Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve an API key from the credential chain (no CLI flag step).
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's api_key_env → env var lookup
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Conventional env var
    if let Ok(val) = std::env::var("GATEWATCH_API_KEY") {
        return Ok(SecretString::from(val));
    }

    // 3. Plaintext in config
    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve `MonitorAuth` from a profile. A share token wins over an API
/// key: a profile carrying one is deliberately read-only.
pub fn resolve_auth(profile: &Profile, profile_name: &str) -> Result<MonitorAuth, ConfigError> {
    if let Some(ref token) = profile.share_token {
        return Ok(MonitorAuth::ShareToken(token.clone()));
    }
    let key = resolve_api_key(profile, profile_name)?;
    Ok(MonitorAuth::ApiKey(key))
}

// ── MonitorConfig construction ──────────────────────────────────────

/// Build a `MonitorConfig` from a profile -- no CLI flag overrides.
pub fn profile_to_monitor_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<MonitorConfig, ConfigError> {
    let gateway: url::Url = profile.gateway.parse().map_err(|_| ConfigError::Validation {
        field: "gateway".into(),
        reason: format!("invalid URL: {}", profile.gateway),
    })?;

    let auth = resolve_auth(profile, profile_name)?;

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = MonitorConfig::new(gateway, auth);
    config.account_id = profile.account_id.clone();
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(30));
    Ok(config)
}
