//! Watch command: follow live node updates until interrupted.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use gatewatch_core::{
    ConnectionState, DashboardState, Monitor, MonitorConfig, MonitorNode,
};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    mut config: MonitorConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    config.live_updates = true;

    let color = output::should_color(&global.color);
    let quiet = global.quiet;

    let monitor = Monitor::new(config)?;
    monitor.connect().await?;

    let mut conn = monitor.connection_state();
    let mut state = monitor.state();
    let mut prev = state.current().clone();

    // Initial snapshot so the user sees the starting picture
    render_update(&prev, None, &args, &global.output, color, quiet);

    let deadline = args.duration.map(|s| Instant::now() + Duration::from_secs(s));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                if !quiet {
                    eprintln!("interrupted, shutting down");
                }
                break;
            }
            () = wait_for(deadline) => {
                if !quiet {
                    eprintln!("watch duration elapsed");
                }
                break;
            }
            changed = conn.changed() => {
                if changed.is_err() {
                    break;
                }
                let s = conn.borrow_and_update().clone();
                report_connection(&s, quiet);
                if s == ConnectionState::Failed {
                    break;
                }
            }
            next = state.changed() => {
                let Some(next) = next else { break };
                render_update(&next, Some(&prev), &args, &global.output, color, quiet);
                prev = next;
            }
        }
    }

    monitor.disconnect().await;
    Ok(())
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(d).await,
        None => std::future::pending().await,
    }
}

fn report_connection(state: &ConnectionState, quiet: bool) {
    if quiet {
        return;
    }
    match state {
        ConnectionState::Connected => eprintln!("* connected"),
        ConnectionState::Connecting => eprintln!("* connecting..."),
        ConnectionState::Reconnecting { attempt } => {
            eprintln!("* connection lost, reconnecting (attempt {attempt})");
        }
        ConnectionState::Disconnected => eprintln!("* disconnected"),
        ConnectionState::Failed => eprintln!("* connection failed"),
    }
}

/// Print the nodes that changed since the previous snapshot.
///
/// Untouched nodes keep pointer identity across snapshots, so a cheap
/// `Arc::ptr_eq` scan finds exactly the replaced entries.
fn render_update(
    state: &DashboardState,
    prev: Option<&DashboardState>,
    args: &WatchArgs,
    format: &OutputFormat,
    color: bool,
    quiet: bool,
) {
    if quiet {
        return;
    }

    let dashboard = state.dashboard();
    for node in &dashboard.nodes {
        if !selected(node, args) {
            continue;
        }
        if let Some(prev) = prev {
            if let Some(old) = prev.dashboard().node(&node.id) {
                if Arc::ptr_eq(old, node) {
                    continue;
                }
            }
        }
        print_node_line(node, format, color);
    }
}

fn selected(node: &Arc<MonitorNode>, args: &WatchArgs) -> bool {
    match &args.nodes {
        Some(ids) => ids.iter().any(|id| id == &node.id),
        None => true,
    }
}

fn print_node_line(node: &Arc<MonitorNode>, format: &OutputFormat, color: bool) {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => {
            // NDJSON: one event per line for piping into jq etc.
            println!("{}", output::render_json_compact(node));
        }
        OutputFormat::Yaml => {
            println!("---\n{}", output::render_yaml(node).trim_end());
        }
        OutputFormat::Plain => {
            println!("{}\t{}", node.id, node.resolved_status());
        }
        OutputFormat::Table => {
            let when = node.last_check_at.as_deref().unwrap_or("-");
            println!(
                "{:<24} {:<10} {:>7} {:>6} ms  {}",
                node.name,
                super::status::render_status(node.resolved_status(), color),
                super::status::format_rate(node.success_rate),
                node.avg_response_time,
                when,
            );
        }
    }
}
