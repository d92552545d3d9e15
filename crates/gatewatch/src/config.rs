//! CLI configuration -- thin wrapper around `gatewatch_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--gateway, --api-key, etc.).

use std::time::Duration;

use secrecy::SecretString;

use gatewatch_core::{MonitorAuth, MonitorConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use gatewatch_config::{
    Config, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `MonitorConfig` from the config file, profile, and CLI overrides.
pub fn build_monitor_config(global: &GlobalOpts) -> Result<MonitorConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    // If a profile exists, use it with CLI flag overrides
    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, global);
    }

    // No profile found -- try to build from CLI flags / env vars alone
    let url_str = global.gateway.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;

    let gateway: url::Url = url_str.parse().map_err(|_| CliError::Validation {
        field: "gateway".into(),
        reason: format!("invalid URL: {url_str}"),
    })?;

    let auth = if let Some(ref token) = global.share_token {
        MonitorAuth::ShareToken(token.clone())
    } else if let Some(ref key) = global.api_key {
        MonitorAuth::ApiKey(SecretString::from(key.clone()))
    } else {
        return Err(CliError::NoCredentials {
            profile: profile_name,
        });
    };

    let mut config = MonitorConfig::new(gateway, auth);
    config.account_id = global.account.clone();
    config.tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        TlsVerification::SystemDefaults
    };
    config.timeout = Duration::from_secs(global.timeout);
    Ok(config)
}

/// Translate a `Profile` + global flags into a `MonitorConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<MonitorConfig, CliError> {
    // 1. Gateway URL (flag > env > profile)
    let url_str = global.gateway.as_deref().unwrap_or(&profile.gateway);
    let gateway: url::Url = url_str.parse().map_err(|_| CliError::Validation {
        field: "gateway".into(),
        reason: format!("invalid URL: {url_str}"),
    })?;

    // 2. Auth (flag share token > flag api key > profile chain)
    let auth = if let Some(ref token) = global.share_token {
        MonitorAuth::ShareToken(token.clone())
    } else if let Some(ref key) = global.api_key {
        MonitorAuth::ApiKey(SecretString::from(key.clone()))
    } else {
        gatewatch_config::resolve_auth(profile, profile_name)?
    };

    // 3. TLS verification
    let tls = if global.insecure || profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    // 4. Account scope (flag > profile)
    let account_id = global.account.clone().or_else(|| profile.account_id.clone());

    let mut config = MonitorConfig::new(gateway, auth);
    config.account_id = account_id;
    config.tls = tls;
    config.timeout = Duration::from_secs(global.timeout);
    Ok(config)
}
