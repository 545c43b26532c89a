//! CLI entry point for the research agent.

mod agents;
mod cli;
mod commands;
mod output;

use std::path::Path;

use clap::Parser;

use crate::cli::Cli;

/// Parent directories searched for a project `.env`.
const ENV_SEARCH_DEPTH: usize = 32;

/// Load the nearest `.env`, walking up from the current directory.
/// Variables already set in the environment win.
fn load_env() {
    let Ok(cwd) = std::env::current_dir() else {
        return;
    };
    let mut dir: &Path = &cwd;
    for _ in 0..ENV_SEARCH_DEPTH {
        let candidate = dir.join(".env");
        if candidate.is_file() {
            let _ = dotenvy::from_path(&candidate);
            return;
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => return,
        }
    }
}

#[tokio::main]
async fn main() {
    load_env();
    let cli = Cli::parse();
    output::init(cli.output);

    if let Err(e) = commands::handle(cli).await {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
