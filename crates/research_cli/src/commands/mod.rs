//! Command dispatch.

pub mod agents;
pub mod chat;
pub mod inspect;
pub mod replay;
pub mod session;

use crate::cli::{Cli, Command};
use anyhow::Result;

pub async fn handle(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Command::Chat {
        model: None,
        claude_bin: None,
        workdir: None,
    }) {
        Command::Chat {
            model,
            claude_bin,
            workdir,
        } => {
            let args = chat::ChatArgs {
                model,
                claude_bin,
                workdir,
            };
            chat::handle(&cli.logs_dir, cli.verbose, args).await
        }
        Command::Replay { script } => replay::handle(&script, &cli.logs_dir, cli.verbose).await,
        Command::Agents => agents::handle(),
        Command::Inspect { path } => inspect::handle(&path),
    }
}
