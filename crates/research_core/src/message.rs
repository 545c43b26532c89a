//! Closed shapes for the runtime's response stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Thinking {
        thinking: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: Value,
        #[serde(default)]
        is_error: bool,
    },
}

impl ContentBlock {
    pub fn text(content: impl Into<String>) -> Self {
        ContentBlock::Text {
            text: content.into(),
        }
    }

    pub fn thinking(content: impl Into<String>) -> Self {
        ContentBlock::Thinking {
            thinking: content.into(),
        }
    }

    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        ContentBlock::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    pub fn tool_result(tool_use_id: impl Into<String>, content: Value, is_error: bool) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content,
            is_error,
        }
    }
}

/// Summary the runtime emits when a turn finishes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub num_turns: u32,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeMessage {
    System {
        subtype: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },
    Assistant {
        content: Vec<ContentBlock>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<String>,
    },
    User {
        content: Vec<ContentBlock>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<String>,
    },
    Result(TurnResult),
}

impl RuntimeMessage {
    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        RuntimeMessage::Assistant {
            content,
            parent_tool_use_id: None,
        }
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::assistant(vec![ContentBlock::text(text)])
    }

    /// Assistant output produced inside a subagent spawned by `parent_tool_use_id`.
    pub fn subagent(parent_tool_use_id: impl Into<String>, content: Vec<ContentBlock>) -> Self {
        RuntimeMessage::Assistant {
            content,
            parent_tool_use_id: Some(parent_tool_use_id.into()),
        }
    }

    pub fn result(result: TurnResult) -> Self {
        RuntimeMessage::Result(result)
    }

    /// Whether the message belongs to the lead agent's own conversation.
    pub fn is_lead(&self) -> bool {
        match self {
            RuntimeMessage::Assistant {
                parent_tool_use_id, ..
            }
            | RuntimeMessage::User {
                parent_tool_use_id, ..
            } => parent_tool_use_id.is_none(),
            RuntimeMessage::System { .. } | RuntimeMessage::Result(_) => true,
        }
    }
}
