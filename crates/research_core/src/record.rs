use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::agent::{AgentIdentity, Attribution};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Matched pre and post.
    Completed,
    /// A post arrived with no open call to match.
    Unmatched,
    /// Still open when the session closed.
    Incomplete,
    /// Displaced by a second start carrying the same correlation token.
    Superseded,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Completed => "completed",
            RecordStatus::Unmatched => "unmatched",
            RecordStatus::Incomplete => "incomplete",
            RecordStatus::Superseded => "superseded",
        }
    }
}

/// One line of the structured tool-call log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub id: Uuid,
    pub status: RecordStatus,
    pub agent: AgentIdentity,
    pub attribution: Attribution,
    pub tool: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_use_id: Option<String>,
    #[serde(default)]
    pub input: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ToolCallRecord {
    pub fn new(
        status: RecordStatus,
        agent: AgentIdentity,
        attribution: Attribution,
        tool: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            status,
            agent,
            attribution,
            tool: tool.into(),
            tool_use_id: None,
            input: Value::Null,
            output: None,
            is_error: false,
            started_at: None,
            ended_at: None,
            duration_ms: None,
        }
    }

    pub fn with_tool_use_id(mut self, id: Option<String>) -> Self {
        self.tool_use_id = id;
        self
    }

    pub fn with_input(mut self, input: Value) -> Self {
        self.input = input;
        self
    }

    pub fn with_output(mut self, output: Value, is_error: bool) -> Self {
        self.output = Some(output);
        self.is_error = is_error;
        self
    }

    pub fn with_started_at(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = Some(at);
        self
    }

    /// Sets the end time and, when a start is known, the duration.
    ///
    /// Clock skew between hook timestamps never yields a negative duration.
    pub fn with_ended_at(mut self, at: DateTime<Utc>) -> Self {
        self.ended_at = Some(at);
        if let Some(start) = self.started_at {
            let ms = (at - start).num_milliseconds().max(0);
            self.duration_ms = Some(ms as u64);
        }
        self
    }
}
