//! Renders the runtime's response stream into the transcript.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use research_core::{ContentBlock, RuntimeMessage, TurnResult};
use tracing::debug;

use crate::tracker::SubagentTracker;
use crate::transcript::TranscriptSink;

/// What one turn produced, as seen by the processor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOutcome {
    pub messages: usize,
    pub text_blocks: usize,
    pub tool_uses: usize,
    /// Summary from the runtime's final `result` message, if one arrived.
    pub result: Option<TurnResult>,
}

impl TurnOutcome {
    pub fn is_error(&self) -> bool {
        self.result.as_ref().is_some_and(|r| r.is_error)
    }
}

pub struct MessageStreamProcessor {
    tracker: Arc<SubagentTracker>,
    transcript: Arc<TranscriptSink>,
}

impl MessageStreamProcessor {
    pub fn new(tracker: Arc<SubagentTracker>) -> Self {
        let transcript = Arc::clone(tracker.transcript());
        Self { tracker, transcript }
    }

    /// Render one message. Returns the turn summary for `result` messages.
    pub fn process_message(&self, message: &RuntimeMessage) -> Option<TurnResult> {
        match message {
            RuntimeMessage::Assistant {
                content,
                parent_tool_use_id: None,
            } => {
                for block in content {
                    self.render_lead_block(block);
                }
                None
            }
            RuntimeMessage::Assistant {
                content,
                parent_tool_use_id: Some(parent),
            } => {
                debug!(parent = %parent, blocks = content.len(), "Subagent message not rendered");
                None
            }
            RuntimeMessage::User { content, .. } => {
                debug!(blocks = content.len(), "Tool results left to hooks");
                None
            }
            RuntimeMessage::System { subtype, session_id } => {
                debug!(subtype = %subtype, session_id = ?session_id, "Runtime system message");
                None
            }
            RuntimeMessage::Result(result) => {
                debug!(
                    is_error = result.is_error,
                    num_turns = result.num_turns,
                    duration_ms = result.duration_ms,
                    "Turn finished"
                );
                Some(result.clone())
            }
        }
    }

    /// Drain `stream` in arrival order, rendering as messages come in.
    ///
    /// Stops at the first stream error and returns it.
    pub async fn consume<S, E>(&self, stream: S) -> Result<TurnOutcome, E>
    where
        S: Stream<Item = Result<RuntimeMessage, E>>,
    {
        let mut stream = std::pin::pin!(stream);
        let mut outcome = TurnOutcome::default();

        while let Some(message) = stream.next().await {
            let message = message?;
            outcome.messages += 1;
            if let RuntimeMessage::Assistant {
                content,
                parent_tool_use_id: None,
            } = &message
            {
                for block in content {
                    match block {
                        ContentBlock::Text { .. } => outcome.text_blocks += 1,
                        ContentBlock::ToolUse { .. } => outcome.tool_uses += 1,
                        _ => {}
                    }
                }
            }
            if let Some(result) = self.process_message(&message) {
                outcome.result = Some(result);
            }
        }

        Ok(outcome)
    }

    fn render_lead_block(&self, block: &ContentBlock) {
        match block {
            ContentBlock::Text { text } => self.transcript.write_with_end(text, ""),
            ContentBlock::ToolUse { .. } => self.tracker.render_lead_tool_use(block),
            ContentBlock::Thinking { thinking } => {
                debug!(chars = thinking.chars().count(), "Thinking block not rendered");
            }
            ContentBlock::ToolResult { tool_use_id, .. } => {
                debug!(tool_use_id = %tool_use_id, "Tool result in assistant message not rendered");
            }
        }
    }
}
