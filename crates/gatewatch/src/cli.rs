//! Clap derive structures for the `gatewatch` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// gatewatch -- live upstream monitoring for Claude API gateways
#[derive(Debug, Parser)]
#[command(
    name = "gatewatch",
    version,
    about = "Watch gateway upstream nodes from the command line",
    long_about = "A CLI dashboard for Claude API proxy gateways.\n\n\
        Fetches the monitor dashboard over REST and follows live node\n\
        status, metrics, and health-check events over WebSocket.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Gateway profile to use
    #[arg(long, short = 'p', env = "GATEWATCH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Gateway URL (overrides profile)
    #[arg(long, short = 'g', env = "GATEWATCH_GATEWAY", global = true)]
    pub gateway: Option<String>,

    /// Account to monitor (admins may target another account)
    #[arg(long, short = 'a', env = "GATEWATCH_ACCOUNT", global = true)]
    pub account: Option<String>,

    /// Account API key
    #[arg(long, env = "GATEWATCH_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Read-only share token (alternative to an API key)
    #[arg(long, env = "GATEWATCH_SHARE_TOKEN", global = true, hide_env = true)]
    pub share_token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "GATEWATCH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "GATEWATCH_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "GATEWATCH_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the current dashboard snapshot
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Follow live node updates until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Query a node's health-check history
    #[command(alias = "hist")]
    History(HistoryArgs),

    /// Manage read-only monitor shares
    Share(ShareArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  STATUS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Show one node in detail instead of the full dashboard
    pub node: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Only report updates for these node IDs (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub nodes: Option<Vec<String>>,

    /// Exit after this many seconds (default: run until Ctrl-C)
    #[arg(long)]
    pub duration: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  HISTORY
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Node ID to query
    pub node: String,

    /// Range start (RFC3339; default: 24h before end)
    #[arg(long)]
    pub from: Option<String>,

    /// Range end (RFC3339; default: now)
    #[arg(long)]
    pub to: Option<String>,

    /// Max records (gateway caps at 2000)
    #[arg(long, short = 'l', default_value = "300")]
    pub limit: u32,

    /// Pagination offset
    #[arg(long, default_value = "0")]
    pub offset: u32,

    /// Only show failed checks
    #[arg(long)]
    pub failures: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SHARE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ShareArgs {
    #[command(subcommand)]
    pub command: ShareCommand,
}

#[derive(Debug, Subcommand)]
pub enum ShareCommand {
    /// Create a read-only share link
    Create {
        /// Expiry: 1h, 24h, 168h, or permanent
        #[arg(long, default_value = "24h")]
        expire_in: String,
    },

    /// List existing shares
    #[command(alias = "ls")]
    List,

    /// Revoke a share by ID
    Revoke {
        /// Share ID
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or update a profile non-interactively
    Init {
        /// Gateway base URL
        #[arg(long, required = true)]
        gateway: String,

        /// Profile name to write
        #[arg(long, default_value = "default")]
        name: String,

        /// Environment variable holding the API key
        #[arg(long)]
        api_key_env: Option<String>,

        /// Read-only share token
        #[arg(long)]
        share_token: Option<String>,
    },

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
