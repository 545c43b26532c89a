//! Command line for one turn of the agent CLI.

use std::process::Stdio;

use research_core::AgentRoster;
use serde_json::{json, Map, Value};
use tokio::process::Command;

use crate::config::RuntimeConfig;
use crate::options::RuntimeOptions;

/// Subagent declarations in the shape `--agents` expects.
pub fn agents_json(roster: &AgentRoster) -> Value {
    let agents: Map<String, Value> = roster
        .iter()
        .map(|agent| {
            (
                agent.name.clone(),
                json!({
                    "description": agent.description,
                    "prompt": agent.prompt,
                    "tools": agent.tools,
                    "model": agent.model.as_str(),
                }),
            )
        })
        .collect();
    Value::Object(agents)
}

/// Arguments for a print-mode, stream-json turn. `resume` continues an
/// earlier conversation.
///
/// The prompt always goes last, after `--`, so user text starting with a dash
/// is never read as a flag.
pub fn build_args(config: &RuntimeConfig, options: &RuntimeOptions, prompt: &str, resume: Option<&str>) -> Vec<String> {
    let model = options.model.as_deref().unwrap_or(&config.model);
    let permission_mode = options.permission_mode.unwrap_or(config.permission_mode);
    let mut args = vec![
        "-p".to_string(),
        "--output-format".to_string(),
        "stream-json".to_string(),
        "--verbose".to_string(),
        "--model".to_string(),
        model.to_string(),
        "--permission-mode".to_string(),
        permission_mode.as_str().to_string(),
    ];

    if !options.allowed_tools.is_empty() {
        args.push("--allowedTools".to_string());
        args.push(options.allowed_tools.join(","));
    }

    if !options.system_prompt.is_empty() {
        args.push("--system-prompt".to_string());
        args.push(options.system_prompt.clone());
    }

    if !options.agents.is_empty() {
        args.push("--agents".to_string());
        args.push(agents_json(&options.agents).to_string());
    }

    if let Some(session) = resume {
        args.push("--resume".to_string());
        args.push(session.to_string());
    }

    args.push("--".to_string());
    args.push(prompt.to_string());
    args
}

pub fn build_command(config: &RuntimeConfig, options: &RuntimeOptions, prompt: &str, resume: Option<&str>) -> Command {
    let mut cmd = Command::new(&config.claude_bin);
    cmd.args(build_args(config, options, prompt, resume))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &config.working_dir {
        cmd.current_dir(dir);
    }
    cmd
}
