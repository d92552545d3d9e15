//! Config command handlers: profile management without a gateway round-trip.

use tabled::Tabled;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init {
            gateway,
            name,
            api_key_env,
            share_token,
        } => init(&gateway, name, api_key_env, share_token, global),
        ConfigCommand::Show => show(global),
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }
        ConfigCommand::Profiles => profiles(global),
        ConfigCommand::Use { name } => use_profile(name, global),
    }
}

// ── init ────────────────────────────────────────────────────────────

fn init(
    gateway: &str,
    name: String,
    api_key_env: Option<String>,
    share_token: Option<String>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let _: url::Url = gateway.parse().map_err(|_| CliError::Validation {
        field: "gateway".into(),
        reason: format!("invalid URL: {gateway}"),
    })?;

    let mut cfg = config::load_config_or_default();
    let existed = cfg.profiles.contains_key(&name);

    let profile = cfg.profiles.entry(name.clone()).or_default();
    profile.gateway = gateway.to_string();
    if api_key_env.is_some() {
        profile.api_key_env = api_key_env;
    }
    if share_token.is_some() {
        profile.share_token = share_token;
    }

    // First profile written becomes the default
    if cfg.default_profile.is_none() || cfg.profiles.len() == 1 {
        cfg.default_profile = Some(name.clone());
    }

    config::save_config(&cfg)?;

    if !global.quiet {
        let action = if existed { "updated" } else { "created" };
        eprintln!(
            "profile '{name}' {action} in {}",
            config::config_path().display()
        );
    }
    Ok(())
}

// ── show ────────────────────────────────────────────────────────────

fn show(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let redacted = redact(cfg);

    let out = match global.output {
        crate::cli::OutputFormat::Json => output::render_json_pretty(&redacted),
        crate::cli::OutputFormat::JsonCompact => output::render_json_compact(&redacted),
        _ => output::render_yaml(&redacted),
    };
    output::print_output(out.trim_end(), global.quiet);
    Ok(())
}

/// Plaintext credentials never leave the config file.
fn redact(mut cfg: Config) -> Config {
    for profile in cfg.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some("<redacted>".into());
        }
        if profile.share_token.is_some() {
            profile.share_token = Some("<redacted>".into());
        }
    }
    cfg
}

// ── profiles ────────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Gateway")]
    gateway: String,
    #[tabled(rename = "Auth")]
    auth: String,
    #[tabled(rename = "Default")]
    default: String,
}

fn profiles(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let default = cfg.default_profile.clone().unwrap_or_default();

    let mut names: Vec<&String> = cfg.profiles.keys().collect();
    names.sort();

    let rows: Vec<ProfileRow> = names
        .iter()
        .map(|name| {
            let p = &cfg.profiles[*name];
            ProfileRow {
                name: (*name).clone(),
                gateway: p.gateway.clone(),
                auth: auth_kind(p).into(),
                default: if **name == default { "*" } else { "" }.into(),
            }
        })
        .collect();

    let out = match global.output {
        crate::cli::OutputFormat::Plain => names
            .iter()
            .map(|n| n.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
        _ => {
            use tabled::{settings::Style, Table};
            Table::new(&rows).with(Style::rounded()).to_string()
        }
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

fn auth_kind(profile: &Profile) -> &'static str {
    if profile.share_token.is_some() {
        "share token"
    } else if profile.api_key_env.is_some() {
        "api key (env)"
    } else if profile.api_key.is_some() {
        "api key"
    } else {
        "none"
    }
}

// ── use ─────────────────────────────────────────────────────────────

fn use_profile(name: String, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();

    if !cfg.profiles.contains_key(&name) {
        let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
        available.sort_unstable();
        return Err(CliError::ProfileNotFound {
            name,
            available: if available.is_empty() {
                "(none)".into()
            } else {
                available.join(", ")
            },
        });
    }

    cfg.default_profile = Some(name.clone());
    config::save_config(&cfg)?;

    if !global.quiet {
        eprintln!("default profile set to '{name}'");
    }
    Ok(())
}
