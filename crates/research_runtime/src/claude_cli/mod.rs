//! Runtime backed by the `claude` CLI in stream-json print mode.
//!
//! Every turn spawns one process. The CLI's session id, announced in its
//! first event, is passed back with `--resume` on later turns so the lead
//! agent keeps its conversation.

pub mod command;
pub mod protocol;

use std::collections::VecDeque;

use async_trait::async_trait;
use research_core::{RuntimeMessage, ToolInvocationEvent};
use research_observability::record_error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::options::RuntimeOptions;
use crate::runtime::AgentRuntime;

use self::protocol::HookEventBuilder;

struct Turn {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    stderr: Option<JoinHandle<String>>,
    line_no: usize,
}

pub struct ClaudeCliRuntime {
    config: RuntimeConfig,
    options: RuntimeOptions,
    connected: bool,
    session_id: Option<String>,
    turn: Option<Turn>,
    events: HookEventBuilder,
    /// Hook events of the last yielded message, fired on the next pull so
    /// the caller renders the message before its hooks run.
    pending: VecDeque<ToolInvocationEvent>,
}

impl ClaudeCliRuntime {
    pub fn new(config: RuntimeConfig, options: RuntimeOptions) -> Self {
        Self {
            config,
            options,
            connected: false,
            session_id: None,
            turn: None,
            events: HookEventBuilder::new(),
            pending: VecDeque::new(),
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    fn fire_pending(&mut self) {
        while let Some(event) = self.pending.pop_front() {
            self.options.fire(&event);
        }
    }

    fn program(&self) -> String {
        self.config.claude_bin.display().to_string()
    }

    async fn finish_turn(&mut self, mut turn: Turn) -> Result<()> {
        let status = turn.child.wait().await?;
        let stderr = match turn.stderr.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };
        if status.success() {
            debug!(lines = turn.line_no, "Runtime turn finished");
            Ok(())
        } else {
            let err = RuntimeError::ProcessFailed {
                code: status.code(),
                stderr: stderr.trim().to_string(),
            };
            record_error(&err);
            Err(err)
        }
    }
}

#[async_trait]
impl AgentRuntime for ClaudeCliRuntime {
    async fn connect(&mut self) -> Result<()> {
        let output = tokio::process::Command::new(&self.config.claude_bin)
            .arg("--version")
            .output()
            .await
            .map_err(|source| RuntimeError::Spawn {
                program: self.program(),
                source,
            })?;
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!(program = %self.program(), version = %version, "Agent runtime connected");
        self.connected = true;
        Ok(())
    }

    async fn query(&mut self, prompt: &str) -> Result<()> {
        if !self.connected {
            return Err(RuntimeError::NotConnected);
        }
        if let Some(mut stale) = self.turn.take() {
            warn!("Previous turn still running, stopping it");
            let _ = stale.child.start_kill();
        }
        self.pending.clear();

        let mut cmd = command::build_command(&self.config, &self.options, prompt, self.session_id.as_deref());
        let mut child = cmd.spawn().map_err(|source| RuntimeError::Spawn {
            program: self.program(),
            source,
        })?;

        let stdout = child.stdout.take().ok_or_else(|| RuntimeError::Spawn {
            program: self.program(),
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout not captured"),
        })?;
        let stderr = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            })
        });

        debug!(resume = ?self.session_id, "Runtime turn started");
        self.turn = Some(Turn {
            child,
            lines: BufReader::new(stdout).lines(),
            stderr,
            line_no: 0,
        });
        Ok(())
    }

    async fn next_message(&mut self) -> Result<Option<RuntimeMessage>> {
        self.fire_pending();

        loop {
            let Some(turn) = self.turn.as_mut() else {
                return Ok(None);
            };

            let Some(line) = turn.lines.next_line().await? else {
                if let Some(turn) = self.turn.take() {
                    self.finish_turn(turn).await?;
                }
                return Ok(None);
            };
            turn.line_no += 1;

            let message = protocol::parse_line(&line).map_err(|e| RuntimeError::Protocol {
                line: turn.line_no,
                message: e.to_string(),
            })?;
            let Some(message) = message else {
                continue;
            };

            match &message {
                RuntimeMessage::System {
                    session_id: Some(id), ..
                } => self.session_id = Some(id.clone()),
                RuntimeMessage::Result(result) => {
                    if let Some(id) = &result.session_id {
                        self.session_id = Some(id.clone());
                    }
                }
                _ => {}
            }

            self.pending.extend(self.events.events_for(&message));
            return Ok(Some(message));
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.fire_pending();
        if let Some(mut turn) = self.turn.take() {
            let _ = turn.child.start_kill();
        }
        self.connected = false;
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use research_core::{ToolHook, ToolInvocationEvent};
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl ToolHook for Recorder {
        fn on_pre_tool_use(&self, event: &ToolInvocationEvent) {
            self.seen.lock().unwrap().push(format!("pre:{}", event.tool_name));
        }

        fn on_post_tool_use(&self, event: &ToolInvocationEvent) {
            self.seen.lock().unwrap().push(format!("post:{}", event.tool_name));
        }
    }

    /// Shell script standing in for the CLI: prints `body` and exits `code`.
    fn fake_cli(dir: &Path, body: &str, code: i32) -> std::path::PathBuf {
        let path = dir.join("fake-claude");
        let script = format!(
            "#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then echo 'fake 1.0'; exit 0; fi\ncat <<'JSON'\n{body}\nJSON\necho 'boom' >&2\nexit {code}\n"
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    const TURN: &str = r#"{"type":"system","subtype":"init","session_id":"sess-42"}
{"type":"assistant","message":{"content":[{"type":"text","text":"On it."},{"type":"tool_use","id":"t1","name":"Task","input":{"subagent_type":"researcher"}}]},"parent_tool_use_id":null}
{"type":"assistant","message":{"content":[{"type":"tool_use","id":"w1","name":"WebSearch","input":{"query":"EV"}}]},"parent_tool_use_id":"t1"}
{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"w1","content":"hits"}]},"parent_tool_use_id":"t1"}
{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"t1","content":[{"type":"text","text":"done"}]}]},"parent_tool_use_id":null}
{"type":"result","subtype":"success","is_error":false,"num_turns":2,"duration_ms":10,"session_id":"sess-42"}"#;

    #[tokio::test]
    async fn test_turn_yields_messages_and_fires_hooks() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_cli(dir.path(), TURN, 0);
        let recorder = Arc::new(Recorder::default());
        let options = RuntimeOptions::new().with_tool_hook(recorder.clone());
        let mut runtime = ClaudeCliRuntime::new(RuntimeConfig::default().with_claude_bin(bin), options);

        runtime.connect().await.unwrap();
        runtime.query("research EVs").await.unwrap();

        let first = runtime.next_message().await.unwrap().unwrap();
        assert!(matches!(first, RuntimeMessage::System { .. }));
        let second = runtime.next_message().await.unwrap().unwrap();
        assert!(second.is_lead());
        // Hooks for a message run only once the next one is pulled.
        assert!(recorder.seen.lock().unwrap().is_empty());

        let mut count = 2;
        while runtime.next_message().await.unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 6);
        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec!["pre:Task", "pre:WebSearch", "post:WebSearch", "post:Task"]
        );
        assert_eq!(runtime.session_id(), Some("sess-42"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_process_failed() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_cli(dir.path(), r#"{"type":"system","subtype":"init"}"#, 3);
        let mut runtime = ClaudeCliRuntime::new(RuntimeConfig::default().with_claude_bin(bin), RuntimeOptions::new());
        runtime.connect().await.unwrap();
        runtime.query("hi").await.unwrap();

        assert!(runtime.next_message().await.unwrap().is_some());
        match runtime.next_message().await {
            Err(RuntimeError::ProcessFailed { code, stderr }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_line_is_protocol_error() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_cli(dir.path(), "not json", 0);
        let mut runtime = ClaudeCliRuntime::new(RuntimeConfig::default().with_claude_bin(bin), RuntimeOptions::new());
        runtime.connect().await.unwrap();
        runtime.query("hi").await.unwrap();

        assert!(matches!(
            runtime.next_message().await,
            Err(RuntimeError::Protocol { line: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_query_requires_connect() {
        let mut runtime = ClaudeCliRuntime::new(RuntimeConfig::default(), RuntimeOptions::new());
        assert!(matches!(runtime.query("hi").await, Err(RuntimeError::NotConnected)));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let config = RuntimeConfig::default().with_claude_bin("/nonexistent/claude-cli");
        let mut runtime = ClaudeCliRuntime::new(config, RuntimeOptions::new());
        assert!(matches!(runtime.connect().await, Err(RuntimeError::Spawn { .. })));
    }
}
