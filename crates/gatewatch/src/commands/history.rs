//! History command: query a node's health-check records.

use owo_colors::OwoColorize;
use tabled::Tabled;

use gatewatch_api::types::HealthHistoryQuery;
use gatewatch_core::{HealthCheckRecord, Monitor, MonitorConfig};

use crate::cli::{GlobalOpts, HistoryArgs};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Latency (ms)")]
    latency: String,
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "Error")]
    error: String,
}

impl HistoryRow {
    fn from_record(rec: &HealthCheckRecord, color: bool) -> Self {
        let result = if rec.success { "ok" } else { "fail" };
        Self {
            time: rec.check_time.clone(),
            result: if !color {
                result.to_string()
            } else if rec.success {
                result.green().to_string()
            } else {
                result.red().to_string()
            },
            latency: rec.response_time_ms.to_string(),
            method: rec.check_method.clone(),
            error: rec.error_message.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    config: MonitorConfig,
    args: HistoryArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let output_format = global.output.clone();
    let quiet = global.quiet;

    let query = HealthHistoryQuery {
        from: args.from.clone(),
        to: args.to.clone(),
        limit: Some(args.limit),
        offset: Some(args.offset),
    };

    Monitor::oneshot(config, |monitor| async move {
        let mut records = monitor.health_history(&args.node, &query).await?;

        if args.failures {
            records.retain(|r| !r.success);
        }

        let out = output::render_list(
            &output_format,
            &records,
            |r| HistoryRow::from_record(r, color),
            |r| {
                format!(
                    "{}\t{}\t{}",
                    r.check_time,
                    if r.success { "ok" } else { "fail" },
                    r.response_time_ms
                )
            },
        );
        output::print_output(&out, quiet);

        if !quiet {
            let failures = records.iter().filter(|r| !r.success).count();
            eprintln!(
                "{} checks for node {} ({} failed)",
                records.len(),
                args.node,
                failures,
            );
        }
        Ok(())
    })
    .await
    .map_err(CliError::from)
}
