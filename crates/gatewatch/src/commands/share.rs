//! Share command handlers: create, list, revoke read-only shares.

use tabled::Tabled;

use gatewatch_api::types::ShareDto;
use gatewatch_core::{Monitor, MonitorConfig};

use crate::cli::{GlobalOpts, ShareArgs, ShareCommand};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ShareRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Token")]
    token: String,
    #[tabled(rename = "Expires")]
    expires: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Revoked")]
    revoked: String,
}

impl From<&ShareDto> for ShareRow {
    fn from(share: &ShareDto) -> Self {
        Self {
            id: share.id.clone(),
            token: truncate_token(&share.token),
            expires: share
                .expire_at
                .clone()
                .unwrap_or_else(|| "never".into()),
            created: share.created_at.clone(),
            revoked: if share.revoked { "yes" } else { "" }.into(),
        }
    }
}

/// Tokens are long; show enough to recognize, not enough to leak casually.
/// Counts characters, not bytes, so multi-byte tokens truncate cleanly.
fn truncate_token(token: &str) -> String {
    let mut chars = token.chars();
    let head: String = chars.by_ref().take(12).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    config: MonitorConfig,
    args: ShareArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ShareCommand::Create { expire_in } => create(config, &expire_in, global).await,
        ShareCommand::List => list(config, global).await,
        ShareCommand::Revoke { id } => revoke(config, &id, global).await,
    }
}

async fn create(
    config: MonitorConfig,
    expire_in: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    validate_expiry(expire_in)?;

    let output_format = global.output.clone();
    let quiet = global.quiet;
    let expire_in = expire_in.to_string();

    Monitor::oneshot(config, |monitor| async move {
        let share = monitor.create_share(&expire_in).await?;

        let out = output::render_single(
            &output_format,
            &share,
            share_detail,
            |s| s.token.clone(),
        );
        output::print_output(&out, quiet);

        if !quiet {
            eprintln!("share created (revoke with: gatewatch share revoke {})", share.id);
        }
        Ok(())
    })
    .await
    .map_err(CliError::from)
}

async fn list(config: MonitorConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let output_format = global.output.clone();
    let quiet = global.quiet;

    Monitor::oneshot(config, |monitor| async move {
        let shares = monitor.list_shares().await?;

        let out = output::render_list(
            &output_format,
            &shares,
            |s| ShareRow::from(s),
            |s| s.id.clone(),
        );
        output::print_output(&out, quiet);
        Ok(())
    })
    .await
    .map_err(CliError::from)
}

async fn revoke(config: MonitorConfig, id: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let quiet = global.quiet;
    let id = id.to_string();

    Monitor::oneshot(config, |monitor| async move {
        monitor.revoke_share(&id).await?;
        if !quiet {
            eprintln!("share {id} revoked");
        }
        Ok(())
    })
    .await
    .map_err(CliError::from)
}

// ── Helpers ─────────────────────────────────────────────────────────

fn validate_expiry(expire_in: &str) -> Result<(), CliError> {
    match expire_in {
        "1h" | "24h" | "168h" | "permanent" => Ok(()),
        other => Err(CliError::Validation {
            field: "expire-in".into(),
            reason: format!("'{other}' is not one of: 1h, 24h, 168h, permanent"),
        }),
    }
}

fn share_detail(share: &ShareDto) -> String {
    let mut s = String::new();
    s.push_str(&format!("ID:       {}\n", share.id));
    s.push_str(&format!("Token:    {}\n", share.token));
    if let Some(ref url) = share.share_url {
        s.push_str(&format!("URL:      {url}\n"));
    }
    s.push_str(&format!(
        "Expires:  {}\n",
        share.expire_at.as_deref().unwrap_or("never")
    ));
    s.trim_end().to_string()
}
