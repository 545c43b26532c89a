//! Transcript line formatting.

use research_core::{AgentIdentity, Attribution};
use serde_json::Value;

const ELLIPSIS: char = '…';

/// Compact single-line preview of a payload.
///
/// Strings are shown raw, everything else as compact JSON. Newlines collapse
/// to spaces. Anything over `max` characters is cut and annotated with the
/// full length.
pub fn preview(value: &Value, max: usize) -> String {
    let raw = match value {
        Value::Null => return String::new(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| "<unrenderable>".to_string()),
    };
    truncate(&collapse_whitespace(&raw), max)
}

fn collapse_whitespace(text: &str) -> String {
    text.split(['\n', '\r']).map(str::trim).filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ")
}

fn truncate(text: &str, max: usize) -> String {
    let total = text.chars().count();
    if total <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max).collect();
    format!("{head}{ELLIPSIS} ({total} chars)")
}

/// `850ms`, `1.2s`, `2m05s`.
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let secs = ms / 1000;
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}

/// Agent name, with `?` when the identity was guessed.
pub fn agent_label(agent: &AgentIdentity, attribution: Attribution) -> String {
    if attribution.is_heuristic() {
        format!("{agent}?")
    } else {
        agent.to_string()
    }
}

fn with_detail(head: String, detail: &str) -> String {
    if detail.is_empty() {
        head
    } else {
        format!("{head}: {detail}")
    }
}

pub fn starting_line(label: &str, tool: &str, input: &str) -> String {
    with_detail(format!("[{label}] starting {tool}"), input)
}

pub fn completed_line(label: &str, tool: &str, duration_ms: Option<u64>, output: &str, is_error: bool) -> String {
    let verb = if is_error { "failed" } else { "completed" };
    let head = match duration_ms {
        Some(ms) => format!("[{label}] {verb} {tool} in {}", format_duration(ms)),
        None => format!("[{label}] {verb} {tool}"),
    };
    with_detail(head, output)
}

pub fn unmatched_line(tool: &str, output: &str) -> String {
    with_detail(format!("[{}] completed {tool} (no matching start)", AgentIdentity::Unknown), output)
}

pub fn incomplete_line(label: &str, tool: &str) -> String {
    format!("[{label}] incomplete {tool}: no completion observed")
}

pub fn superseded_line(label: &str, tool: &str) -> String {
    format!("[{label}] superseded {tool}: a new call reused its id")
}

pub fn delegation_line(subagent: &str, description: &str) -> String {
    let head = format!("→ delegating to {subagent}");
    with_detail(head, description)
}

pub fn lead_tool_line(tool: &str, input: &str) -> String {
    with_detail(format!("[{}] using {tool}", AgentIdentity::Lead), input)
}
