//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Multi-agent research assistant: a lead agent delegating to researcher,
/// data-analyst and report-writer subagents
#[derive(Parser)]
#[command(name = "research-agent", about, version, propagate_version = true)]
pub struct Cli {
    /// What to run (default: chat)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose output (debug-level session log)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format: text (human-readable) or json (machine-readable)
    #[arg(short, long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Directory that holds one sub-directory per session
    #[arg(long, global = true, default_value = "logs")]
    pub logs_dir: PathBuf,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Colored terminal output for humans
    #[default]
    Text,
    /// Structured JSON for machine consumption
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Interactive research session (requires ANTHROPIC_API_KEY)
    Chat {
        /// Lead agent model (overrides RESEARCH_AGENT_MODEL)
        #[arg(long)]
        model: Option<String>,
        /// Path to the `claude` CLI (overrides RESEARCH_AGENT_CLAUDE_BIN)
        #[arg(long)]
        claude_bin: Option<PathBuf>,
        /// Working directory for the agents (default: current directory)
        #[arg(long)]
        workdir: Option<PathBuf>,
    },
    /// Replay a recorded session script through the tracker
    Replay {
        /// JSON script of turns, messages and tool hooks
        script: PathBuf,
    },
    /// List the declared subagents
    Agents,
    /// Summarize a session's tool_calls.jsonl
    Inspect {
        /// Path to a tool_calls.jsonl file or to its session directory
        path: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_is_default() {
        let cli = Cli::try_parse_from(["research-agent"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.logs_dir, PathBuf::from("logs"));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["research-agent", "replay", "turns.json", "--logs-dir", "/tmp/x", "-v"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Replay { ref script }) if script == &PathBuf::from("turns.json")));
        assert_eq!(cli.logs_dir, PathBuf::from("/tmp/x"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_output_json() {
        let cli = Cli::try_parse_from(["research-agent", "-o", "json", "agents"]).unwrap();
        assert!(matches!(cli.output, OutputFormat::Json));
        assert!(matches!(cli.command, Some(Command::Agents)));
    }
}
