//! Replays a recorded session script through the runtime interface.
//!
//! A script is a list of turns. Each turn has the user prompt and the steps
//! the runtime would have produced: messages to yield and tool hooks to fire,
//! in order.
//!
//! ```json
//! {"turns": [{"prompt": "research the EV market", "steps": [
//!   {"message": {"type": "assistant", "content": [{"type": "text", "text": "On it."}]}},
//!   {"pre": {"tool": "WebSearch", "tool_use_id": "w1", "input": {"query": "EV"}}},
//!   {"post": {"tool": "WebSearch", "tool_use_id": "w1", "output": "3 hits"}}
//! ]}]}
//! ```

use std::collections::VecDeque;
use std::path::Path;

use async_trait::async_trait;
use research_core::{AgentIdentity, RuntimeMessage, ToolInvocationEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Result, RuntimeError};
use crate::options::RuntimeOptions;
use crate::runtime::AgentRuntime;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub turns: Vec<ScriptTurn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptTurn {
    pub prompt: String,
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    Message(RuntimeMessage),
    Pre(ScriptedTool),
    Post(ScriptedTool),
}

/// One hook invocation in a script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedTool {
    pub tool: String,
    #[serde(default)]
    pub input: Value,
    #[serde(default)]
    pub output: Value,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_use_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_tool_use_id: Option<String>,
}

impl ScriptedTool {
    fn pre_event(&self) -> ToolInvocationEvent {
        self.decorate(ToolInvocationEvent::pre(self.tool.clone(), self.input.clone()))
    }

    fn post_event(&self) -> ToolInvocationEvent {
        self.decorate(
            ToolInvocationEvent::post(self.tool.clone(), self.input.clone(), self.output.clone()).with_error(self.is_error),
        )
    }

    fn decorate(&self, mut event: ToolInvocationEvent) -> ToolInvocationEvent {
        event.tool_use_id = self.tool_use_id.clone();
        event.context.agent = self.agent.clone();
        event.context.parent_tool_use_id = self.parent_tool_use_id.clone();
        event
    }
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text).map_err(|e| RuntimeError::Script(format!("{}: {e}", path.display())))
    }

    pub fn prompts(&self) -> Vec<&str> {
        self.turns.iter().map(|t| t.prompt.as_str()).collect()
    }
}

pub struct ScriptedRuntime {
    options: RuntimeOptions,
    turns: VecDeque<ScriptTurn>,
    current: VecDeque<ScriptStep>,
    connected: bool,
}

impl ScriptedRuntime {
    pub fn new(script: Script, options: RuntimeOptions) -> Self {
        Self {
            options,
            turns: script.turns.into(),
            current: VecDeque::new(),
            connected: false,
        }
    }

    pub fn remaining_turns(&self) -> usize {
        self.turns.len()
    }
}

#[async_trait]
impl AgentRuntime for ScriptedRuntime {
    async fn connect(&mut self) -> Result<()> {
        info!(turns = self.turns.len(), "Scripted runtime connected");
        self.connected = true;
        Ok(())
    }

    async fn query(&mut self, prompt: &str) -> Result<()> {
        if !self.connected {
            return Err(RuntimeError::NotConnected);
        }
        let turn = self
            .turns
            .pop_front()
            .ok_or_else(|| RuntimeError::Script("no scripted turn left".to_string()))?;
        if turn.prompt != prompt {
            debug!(expected = %turn.prompt, got = %prompt, "Prompt differs from script");
        }
        self.current = turn.steps.into();
        Ok(())
    }

    async fn next_message(&mut self) -> Result<Option<RuntimeMessage>> {
        while let Some(step) = self.current.pop_front() {
            match step {
                ScriptStep::Message(message) => return Ok(Some(message)),
                ScriptStep::Pre(tool) => self.options.fire(&tool.pre_event()),
                ScriptStep::Post(tool) => self.options.fire(&tool.post_event()),
            }
        }
        Ok(None)
    }

    async fn close(&mut self) -> Result<()> {
        self.current.clear();
        self.connected = false;
        Ok(())
    }
}
