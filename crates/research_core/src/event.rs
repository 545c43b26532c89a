use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::AgentIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPhase {
    Pre,
    Post,
}

/// Whatever correlation context the runtime attached to a hook call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentIdentity>,
    /// Id of the delegation call whose subagent issued this tool call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_tool_use_id: Option<String>,
}

impl HookContext {
    pub fn is_empty(&self) -> bool {
        self.agent.is_none() && self.parent_tool_use_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationEvent {
    pub phase: HookPhase,
    pub tool_name: String,
    #[serde(default)]
    pub input: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_use_id: Option<String>,
    #[serde(default)]
    pub context: HookContext,
    pub timestamp: DateTime<Utc>,
}

impl ToolInvocationEvent {
    pub fn pre(tool_name: impl Into<String>, input: Value) -> Self {
        Self {
            phase: HookPhase::Pre,
            tool_name: tool_name.into(),
            input,
            output: None,
            is_error: false,
            tool_use_id: None,
            context: HookContext::default(),
            timestamp: Utc::now(),
        }
    }

    pub fn post(tool_name: impl Into<String>, input: Value, output: Value) -> Self {
        Self {
            phase: HookPhase::Post,
            output: Some(output),
            ..Self::pre(tool_name, input)
        }
    }

    pub fn with_tool_use_id(mut self, id: impl Into<String>) -> Self {
        self.tool_use_id = Some(id.into());
        self
    }

    pub fn with_agent(mut self, agent: AgentIdentity) -> Self {
        self.context.agent = Some(agent);
        self
    }

    pub fn with_parent(mut self, parent_tool_use_id: impl Into<String>) -> Self {
        self.context.parent_tool_use_id = Some(parent_tool_use_id.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_error(mut self, is_error: bool) -> Self {
        self.is_error = is_error;
        self
    }
}

/// Callbacks the runtime fires around every tool execution.
///
/// Implementations must not panic and must not block on anything slower
/// than a local file write: a failing hook would abort the tool call.
pub trait ToolHook: Send + Sync {
    fn on_pre_tool_use(&self, event: &ToolInvocationEvent);

    fn on_post_tool_use(&self, event: &ToolInvocationEvent);

    fn dispatch(&self, event: &ToolInvocationEvent) {
        match event.phase {
            HookPhase::Pre => self.on_pre_tool_use(event),
            HookPhase::Post => self.on_post_tool_use(event),
        }
    }
}
