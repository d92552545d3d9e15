//! Status command handlers.

use std::fmt::Write as _;
use std::sync::Arc;

use owo_colors::OwoColorize;
use tabled::Tabled;

use gatewatch_core::{Monitor, MonitorConfig, MonitorNode, NodeStatus};

use crate::cli::{GlobalOpts, StatusArgs};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Success")]
    success: String,
    #[tabled(rename = "Avg (ms)")]
    avg_ms: String,
    #[tabled(rename = "Ping (ms)")]
    ping: String,
    #[tabled(rename = "Last Check")]
    last_check: String,
    #[tabled(rename = "Error")]
    error: String,
}

impl NodeRow {
    fn from_node(node: &Arc<MonitorNode>, color: bool) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            status: render_status(node.resolved_status(), color),
            success: format_rate(node.success_rate),
            avg_ms: node.avg_response_time.to_string(),
            ping: node
                .last_ping_ms
                .map(|p| p.to_string())
                .unwrap_or_default(),
            last_check: node.last_check_at.clone().unwrap_or_default(),
            error: node.last_error.clone(),
        }
    }
}

/// Render a percentage; `NaN`/`inf` (a node with no samples yet) reads
/// as zero.
pub(crate) fn format_rate(rate: f64) -> String {
    let rate = if rate.is_finite() { rate } else { 0.0 };
    format!("{rate:.1}%")
}

pub(crate) fn render_status(status: NodeStatus, color: bool) -> String {
    if !color {
        return status.to_string();
    }
    match status {
        NodeStatus::Online => status.green().to_string(),
        NodeStatus::Offline => status.red().to_string(),
        NodeStatus::Checking => status.yellow().to_string(),
        NodeStatus::Disabled => status.dimmed().to_string(),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    config: MonitorConfig,
    args: StatusArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let output_format = global.output.clone();
    let quiet = global.quiet;

    Monitor::oneshot(config, |monitor| async move {
        let dashboard = monitor.dashboard();

        match args.node {
            Some(ref node_id) => {
                let node = dashboard.node(node_id).ok_or_else(|| {
                    gatewatch_core::CoreError::NodeNotFound {
                        identifier: node_id.clone(),
                    }
                })?;

                let out = output::render_single(
                    &output_format,
                    node,
                    |n| node_detail(n, color),
                    |n| n.id.clone(),
                );
                output::print_output(&out, quiet);
            }
            None => {
                let out = output::render_list(
                    &output_format,
                    &dashboard.nodes,
                    |n| NodeRow::from_node(n, color),
                    |n| format!("{}\t{}", n.id, n.resolved_status()),
                );
                output::print_output(&out, quiet);

                if !quiet {
                    eprintln!(
                        "{} nodes: {} online, {} offline, {} disabled (as of {})",
                        dashboard.nodes.len(),
                        dashboard.count_by_status(NodeStatus::Online),
                        dashboard.count_by_status(NodeStatus::Offline),
                        dashboard.count_by_status(NodeStatus::Disabled),
                        dashboard.updated_at,
                    );
                }
            }
        }
        Ok(())
    })
    .await
    .map_err(CliError::from)
}

/// Multi-line detail view for a single node.
fn node_detail(node: &Arc<MonitorNode>, color: bool) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "ID:            {}", node.id);
    let _ = writeln!(s, "Name:          {}", node.name);
    let _ = writeln!(s, "URL:           {}", node.url);
    let _ = writeln!(s, "Status:        {}", render_status(node.resolved_status(), color));
    let _ = writeln!(s, "Active:        {}", node.is_active);
    let _ = writeln!(s, "Weight:        {}", node.weight);
    let _ = writeln!(s, "Success rate:  {}", format_rate(node.success_rate));
    let _ = writeln!(s, "Avg response:  {} ms", node.avg_response_time);
    if let Some(ping) = node.last_ping_ms {
        let _ = writeln!(s, "Last ping:     {ping} ms");
    }
    let _ = writeln!(
        s,
        "Requests:      {} total, {} failed",
        node.total_requests, node.failed_requests
    );
    if let Some(ref at) = node.last_check_at {
        let _ = writeln!(s, "Last check:    {at}");
    }
    if !node.last_error.is_empty() {
        let _ = writeln!(s, "Last error:    {}", node.last_error);
    }
    if !node.trend_24h.is_empty() {
        let _ = writeln!(s, "Trend (24h):   {} points", node.trend_24h.len());
    }
    s.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_rates_render_as_zero() {
        assert_eq!(format_rate(f64::NAN), "0.0%");
        assert_eq!(format_rate(f64::INFINITY), "0.0%");
        assert_eq!(format_rate(f64::NEG_INFINITY), "0.0%");
        assert_eq!(format_rate(99.25), "99.2%");
    }
}
