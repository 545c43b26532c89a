//! `research-agent chat`: the interactive research session.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use research_runtime::{AgentRuntime, ClaudeCliRuntime, RuntimeConfig, require_api_key};
use tokio::sync::mpsc;
use tracing::info;

use super::session::{Session, TurnStatus};
use crate::output;

const KEY_URL: &str = "https://console.anthropic.com/settings/keys";

/// Overrides for the runtime configuration taken from the command line.
#[derive(Debug, Default)]
pub struct ChatArgs {
    pub model: Option<String>,
    pub claude_bin: Option<PathBuf>,
    pub workdir: Option<PathBuf>,
}

pub async fn handle(logs_dir: &Path, verbose: bool, args: ChatArgs) -> Result<()> {
    // Checked before anything touches the filesystem.
    require_api_key(|key| std::env::var(key).ok()).map_err(|e| anyhow!("{e}\n  Get your key at: {KEY_URL}"))?;

    let config = runtime_config(args);
    let session = Session::start(logs_dir, verbose)?;
    banner(&session);

    let mut runtime = ClaudeCliRuntime::new(config, session.runtime_options());
    let result = repl(&session, &mut runtime).await;
    session.finish(&mut runtime).await;
    result
}

fn runtime_config(args: ChatArgs) -> RuntimeConfig {
    let mut config = RuntimeConfig::from_env();
    if let Some(model) = args.model {
        config = config.with_model(model);
    }
    if let Some(bin) = args.claude_bin {
        config = config.with_claude_bin(bin);
    }
    if let Some(dir) = args.workdir {
        config = config.with_working_dir(dir);
    }
    config
}

fn banner(session: &Session) {
    let rule = "=".repeat(50);
    println!("\n{rule}");
    output::header("  Research Agent");
    println!("{rule}");
    output::dim("\nResearch any topic and get a comprehensive PDF");
    output::dim("report with data visualizations.");
    output::kv("\nSession logs:", &session.context().dir.display().to_string());
    output::dim("\nType 'exit' to quit.\n");
}

async fn repl(session: &Session, runtime: &mut ClaudeCliRuntime) -> Result<()> {
    runtime
        .connect()
        .await
        .context("Could not start the agent runtime; is the claude CLI installed?")?;

    let mut input = spawn_stdin_reader();
    loop {
        print!("\nYou: ");
        let _ = std::io::stdout().flush();

        let line = tokio::select! {
            line = input.recv() => line,
            _ = session.cancel_token().cancelled() => None,
        };
        let Some(line) = line else {
            break;
        };
        let prompt = line.trim();
        if is_exit(prompt) {
            break;
        }

        match session.run_turn(runtime, prompt).await {
            TurnStatus::Cancelled => break,
            TurnStatus::Completed(_) | TurnStatus::Failed => {}
        }
    }

    info!("Leaving chat loop");
    Ok(())
}

fn is_exit(input: &str) -> bool {
    input.is_empty() || matches!(input.to_lowercase().as_str(), "exit" | "quit" | "q")
}

/// Read stdin on a plain thread so a pending read never holds up shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_words() {
        for input in ["", "exit", "quit", "q", "QUIT", "Exit"] {
            assert!(is_exit(input), "{input:?} should end the session");
        }
        assert!(!is_exit("research the EV market"));
        assert!(!is_exit("quit smoking statistics"));
    }

    #[test]
    fn test_flags_override_env_config() {
        let config = runtime_config(ChatArgs {
            model: Some("sonnet".to_string()),
            claude_bin: Some(PathBuf::from("/opt/claude")),
            workdir: None,
        });
        assert_eq!(config.model, "sonnet");
        assert_eq!(config.claude_bin, PathBuf::from("/opt/claude"));
    }
}
