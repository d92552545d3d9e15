//! Command dispatch: bridges CLI args -> Monitor operations -> output
//! formatting.

pub mod config_cmd;
pub mod history;
pub mod share;
pub mod status;
pub mod watch;

use gatewatch_core::MonitorConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a gateway-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: MonitorConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status(args) => status::handle(config, args, global).await,
        Command::Watch(args) => watch::handle(config, args, global).await,
        Command::History(args) => history::handle(config, args, global).await,
        Command::Share(args) => share::handle(config, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
