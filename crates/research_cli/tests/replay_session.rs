//! Integration test: `research-agent replay` drives a scripted session end to
//! end and leaves a transcript and a tool call log behind.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use research_core::{AgentIdentity, Attribution, RecordStatus};
use research_tracker::{read_records, TOOL_LOG_FILE, TRANSCRIPT_FILE};
use serde_json::json;

fn script() -> serde_json::Value {
    json!({"turns": [{
        "prompt": "Research the EV market",
        "steps": [
            {"message": {"type": "assistant", "content": [
                {"type": "text", "text": "I'll send a researcher."},
                {"type": "tool_use", "id": "task_1", "name": "Task",
                 "input": {"subagent_type": "researcher", "description": "EV sales"}}
            ]}},
            {"pre": {"tool": "Task", "tool_use_id": "task_1",
                     "input": {"subagent_type": "researcher", "description": "EV sales"}}},
            {"pre": {"tool": "WebSearch", "tool_use_id": "ws_1", "parent_tool_use_id": "task_1",
                     "input": {"query": "EV sales 2025"}}},
            {"post": {"tool": "WebSearch", "tool_use_id": "ws_1", "parent_tool_use_id": "task_1",
                      "input": {"query": "EV sales 2025"}, "output": "12 results"}},
            {"post": {"tool": "Task", "tool_use_id": "task_1",
                      "input": {"subagent_type": "researcher", "description": "EV sales"},
                      "output": "notes written"}},
            {"message": {"type": "assistant", "content": [{"type": "text", "text": "Done."}]}},
            {"message": {"type": "result", "num_turns": 2, "duration_ms": 1500}}
        ]
    }]})
}

fn only_session_dir(logs: &Path) -> PathBuf {
    let dirs: Vec<_> = fs::read_dir(logs)
        .expect("logs dir")
        .map(|entry| entry.expect("entry").path())
        .collect();
    assert_eq!(dirs.len(), 1, "expected one session directory, got {dirs:?}");
    dirs.into_iter().next().unwrap()
}

#[test]
fn replay_writes_transcript_and_tool_log() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let script_path = tmp.path().join("ev.json");
    fs::write(&script_path, script().to_string()).unwrap();
    let logs = tmp.path().join("logs");

    let out = Command::new(env!("CARGO_BIN_EXE_research-agent"))
        .current_dir(tmp.path())
        .arg("replay")
        .arg(&script_path)
        .arg("--logs-dir")
        .arg(&logs)
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("RESEARCH_AGENT_LOG")
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("run research-agent");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let session = only_session_dir(&logs);
    let transcript = fs::read_to_string(session.join(TRANSCRIPT_FILE)).unwrap();
    let expected_order = [
        "You: Research the EV market",
        "Agent: I'll send a researcher.",
        "→ delegating to researcher: EV sales",
        "[researcher] starting WebSearch",
        "[researcher] completed WebSearch",
        "Done.",
        "Goodbye!",
    ];
    let mut from = 0;
    for needle in expected_order {
        let at = transcript[from..]
            .find(needle)
            .unwrap_or_else(|| panic!("{needle:?} missing or out of order in:\n{transcript}"));
        from += at + needle.len();
    }
    assert_eq!(transcript.matches("delegating to researcher").count(), 1);
    assert!(!transcript.contains("completed Task"));

    let records = read_records(&session.join(TOOL_LOG_FILE)).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].tool, "WebSearch");
    assert_eq!(records[0].agent, AgentIdentity::subagent("researcher"));
    assert_eq!(records[0].attribution, Attribution::Delegated);
    assert!(records.iter().all(|r| r.status == RecordStatus::Completed));

    // Console mirror carries the same transcript, minus the echoed prompt.
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("[researcher] completed WebSearch"));
    assert!(stdout.contains("Session logs saved to:"));
}

#[test]
fn replay_with_bad_script_creates_nothing() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let script_path = tmp.path().join("broken.json");
    fs::write(&script_path, "{ not json").unwrap();
    let logs = tmp.path().join("logs");

    let out = Command::new(env!("CARGO_BIN_EXE_research-agent"))
        .arg("replay")
        .arg(&script_path)
        .arg("--logs-dir")
        .arg(&logs)
        .stdin(Stdio::null())
        .output()
        .expect("run research-agent");
    assert_eq!(out.status.code(), Some(1));
    assert!(!logs.exists());
}
