//! `research-agent replay`: run a recorded script through the session pipeline.
//!
//! Useful for reproducing a session's transcript and tool log offline. No
//! credential is needed since nothing leaves the process.

use std::path::Path;

use anyhow::{Context, Result};
use research_runtime::{AgentRuntime, Script, ScriptedRuntime};
use tracing::debug;

use super::session::{Session, TurnStatus};
use crate::output;

pub async fn handle(script_path: &Path, logs_dir: &Path, verbose: bool) -> Result<()> {
    // Parse before creating the session so a bad script leaves nothing behind.
    let script = Script::load(script_path)?;
    let prompts: Vec<String> = script.prompts().into_iter().map(str::to_string).collect();

    let session = Session::start(logs_dir, verbose)?;
    output::dim(&format!("Replaying {} turn(s) from {}", prompts.len(), script_path.display()));

    let mut runtime = ScriptedRuntime::new(script, session.runtime_options());
    let result = replay(&session, &mut runtime, &prompts).await;
    session.finish(&mut runtime).await;
    result
}

async fn replay(session: &Session, runtime: &mut ScriptedRuntime, prompts: &[String]) -> Result<()> {
    runtime.connect().await.context("Scripted runtime refused to connect")?;

    let mut failed = 0usize;
    for prompt in prompts {
        if !output::is_json() {
            println!("\nYou: {prompt}");
        }
        match session.run_turn(runtime, prompt).await {
            TurnStatus::Completed(outcome) => {
                debug!(messages = outcome.messages, tool_uses = outcome.tool_uses, "Replayed turn");
            }
            TurnStatus::Failed => failed += 1,
            TurnStatus::Cancelled => break,
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} replayed turn(s) failed", prompts.len());
    }
    Ok(())
}
