//! Line protocol of the agent CLI's `--output-format stream-json` mode.
//!
//! Each stdout line is one JSON event. Events this crate does not model are
//! skipped, unknown content blocks inside a message are dropped.

use research_core::{ContentBlock, RuntimeMessage, ToolInvocationEvent, TurnResult};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    System {
        #[serde(default)]
        subtype: String,
        #[serde(default)]
        session_id: Option<String>,
    },
    Assistant {
        message: WireMessage,
        #[serde(default)]
        parent_tool_use_id: Option<String>,
    },
    User {
        message: WireMessage,
        #[serde(default)]
        parent_tool_use_id: Option<String>,
    },
    Result(TurnResult),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: WireContent,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Blocks(Vec<Value>),
}

impl Default for WireContent {
    fn default() -> Self {
        WireContent::Blocks(Vec::new())
    }
}

impl WireContent {
    fn into_blocks(self) -> Vec<ContentBlock> {
        match self {
            WireContent::Text(text) => vec![ContentBlock::text(text)],
            WireContent::Blocks(raw) => raw
                .into_iter()
                .filter_map(|value| match serde_json::from_value::<ContentBlock>(value) {
                    Ok(block) => Some(block),
                    Err(e) => {
                        debug!(error = %e, "Skipping unsupported content block");
                        None
                    }
                })
                .collect(),
        }
    }
}

/// Parse one stdout line. `Ok(None)` for blank lines and event types that are
/// not part of the message stream.
pub fn parse_line(line: &str) -> Result<Option<RuntimeMessage>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let message = match serde_json::from_str::<WireEvent>(line)? {
        WireEvent::System { subtype, session_id } => RuntimeMessage::System { subtype, session_id },
        WireEvent::Assistant {
            message,
            parent_tool_use_id,
        } => RuntimeMessage::Assistant {
            content: message.content.into_blocks(),
            parent_tool_use_id,
        },
        WireEvent::User {
            message,
            parent_tool_use_id,
        } => RuntimeMessage::User {
            content: message.content.into_blocks(),
            parent_tool_use_id,
        },
        WireEvent::Result(result) => RuntimeMessage::Result(result),
        WireEvent::Other => return Ok(None),
    };
    Ok(Some(message))
}

/// Flatten a tool result's content: text block arrays become one string.
pub fn tool_result_output(content: &Value) -> Value {
    let Value::Array(parts) = content else {
        return content.clone();
    };
    let texts: Option<Vec<&str>> = parts
        .iter()
        .map(|part| match part.get("type").and_then(Value::as_str) {
            Some("text") => part.get("text").and_then(Value::as_str),
            _ => None,
        })
        .collect();
    match texts {
        Some(texts) => Value::String(texts.join("\n")),
        None => content.clone(),
    }
}

/// Remembers started tools so completions can carry their name and input.
#[derive(Debug, Default)]
pub struct HookEventBuilder {
    started: std::collections::HashMap<String, (String, Value)>,
}

impl HookEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hook events implied by `message`, in block order.
    pub fn events_for(&mut self, message: &RuntimeMessage) -> Vec<ToolInvocationEvent> {
        let (content, parent) = match message {
            RuntimeMessage::Assistant {
                content,
                parent_tool_use_id,
            }
            | RuntimeMessage::User {
                content,
                parent_tool_use_id,
            } => (content, parent_tool_use_id),
            _ => return Vec::new(),
        };

        let mut events = Vec::new();
        for block in content {
            let event = match block {
                ContentBlock::ToolUse { id, name, input } => {
                    self.started.insert(id.clone(), (name.clone(), input.clone()));
                    ToolInvocationEvent::pre(name.clone(), input.clone()).with_tool_use_id(id.clone())
                }
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => {
                    let (name, input) = self
                        .started
                        .remove(tool_use_id)
                        .unwrap_or_else(|| ("unknown".to_string(), Value::Null));
                    ToolInvocationEvent::post(name, input, tool_result_output(content))
                        .with_tool_use_id(tool_use_id.clone())
                        .with_error(*is_error)
                }
                _ => continue,
            };
            events.push(match parent {
                Some(parent) => event.with_parent(parent.clone()),
                None => event,
            });
        }
        events
    }
}
