//! Subagent activity tracker.
//!
//! Receives pre/post tool hooks from the runtime, works out which agent issued
//! each call, pairs starts with completions, and writes both the transcript
//! lines and the JSONL records. Hook callers never see an error or a panic.

use std::collections::{BTreeMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use research_core::{
    AgentIdentity, AgentRoster, Attribution, ContentBlock, RecordStatus, ToolCallRecord, ToolHook,
    ToolInvocationEvent, DELEGATION_TOOL,
};
use research_observability::tool_span;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::attribution::Attributor;
use crate::config::TrackerConfig;
use crate::error::Result;
use crate::event_log::EventLog;
use crate::inflight::{InFlightCall, InFlightTable};
use crate::render;
use crate::session::SessionContext;
use crate::transcript::TranscriptSink;

/// Per-session counters, printed when the session ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrackerStats {
    pub completed: u64,
    pub failed: u64,
    pub unmatched: u64,
    pub incomplete: u64,
    pub superseded: u64,
    /// Records per agent label.
    pub per_agent: BTreeMap<String, u64>,
}

impl TrackerStats {
    fn count(&mut self, record: &ToolCallRecord) {
        match record.status {
            RecordStatus::Completed => self.completed += 1,
            RecordStatus::Unmatched => self.unmatched += 1,
            RecordStatus::Incomplete => self.incomplete += 1,
            RecordStatus::Superseded => self.superseded += 1,
        }
        if record.is_error {
            self.failed += 1;
        }
        *self.per_agent.entry(record.agent.to_string()).or_default() += 1;
    }

    pub fn total(&self) -> u64 {
        self.completed + self.unmatched + self.incomplete + self.superseded
    }
}

struct TrackerState {
    attributor: Attributor,
    in_flight: InFlightTable,
    /// Tool-use ids that already have a line in the transcript.
    announced: HashSet<String>,
    stats: TrackerStats,
    closed: bool,
}

pub struct SubagentTracker {
    transcript: Arc<TranscriptSink>,
    event_log: EventLog,
    config: TrackerConfig,
    state: Mutex<TrackerState>,
}

impl SubagentTracker {
    pub fn new(transcript: Arc<TranscriptSink>, event_log: EventLog, roster: AgentRoster, config: TrackerConfig) -> Self {
        Self {
            transcript,
            event_log,
            config,
            state: Mutex::new(TrackerState {
                attributor: Attributor::new(roster),
                in_flight: InFlightTable::new(),
                announced: HashSet::new(),
                stats: TrackerStats::default(),
                closed: false,
            }),
        }
    }

    /// Tracker writing to the session's `tool_calls.jsonl`.
    pub fn for_session(
        session: &SessionContext,
        transcript: Arc<TranscriptSink>,
        roster: AgentRoster,
        config: TrackerConfig,
    ) -> Result<Self> {
        let event_log = EventLog::open(&session.tool_log_path)?;
        Ok(Self::new(transcript, event_log, roster, config))
    }

    pub fn transcript(&self) -> &Arc<TranscriptSink> {
        &self.transcript
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// A tool is about to run.
    pub fn on_pre_tool_use(&self, event: &ToolInvocationEvent) {
        self.guarded("pre", &event.tool_name, || self.handle_pre(event));
    }

    /// A tool finished.
    pub fn on_post_tool_use(&self, event: &ToolInvocationEvent) {
        self.guarded("post", &event.tool_name, || self.handle_post(event));
    }

    /// Render a tool-use block from the lead agent's own response.
    ///
    /// Delegation blocks register the spawned subagent and become a
    /// "delegating" line. Nothing is written for a call the hooks already
    /// announced.
    ///
    /// Delegation calls never become tool-call records: the work they stand
    /// for is recorded under the subagent that does it.
    pub fn render_lead_tool_use(&self, block: &ContentBlock) {
        let ContentBlock::ToolUse { id, name, input } = block else {
            return;
        };
        self.guarded("stream", name, || {
            let mut state = self.lock();
            if state.closed {
                return;
            }
            let line = if name == DELEGATION_TOOL {
                let subagent = state.attributor.register_spawn(Some(id.as_str()), input);
                self.delegation_line(subagent.as_ref(), input)
            } else {
                render::lead_tool_line(name, &render::preview(input, self.config.input_preview_chars))
            };
            self.announce(&mut state, Some(id.as_str()), &line);
        });
    }

    /// Record every call still open as `incomplete`, then close the log.
    ///
    /// Idempotent. The transcript stays open; its owner closes it afterwards.
    pub fn close(&self) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        state.closed = true;

        let now = chrono::Utc::now();
        for call in state.in_flight.drain() {
            let label = render::agent_label(&call.agent, call.attribution);
            self.transcript.write_line(&render::incomplete_line(&label, &call.tool_name));
            let record = Self::record_for(RecordStatus::Incomplete, &call).with_ended_at(now);
            self.append(&mut state, record);
        }

        self.event_log.close();
        info!(
            completed = state.stats.completed,
            unmatched = state.stats.unmatched,
            incomplete = state.stats.incomplete,
            superseded = state.stats.superseded,
            dropped = self.event_log.dropped(),
            "Tracker closed"
        );
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn summary(&self) -> TrackerStats {
        self.lock().stats.clone()
    }

    pub fn open_calls(&self) -> usize {
        self.lock().in_flight.len()
    }

    /// Calls with a transcript line whose completion has not arrived yet.
    pub fn pending_announcements(&self) -> usize {
        self.lock().announced.len()
    }

    fn handle_pre(&self, event: &ToolInvocationEvent) {
        let span = tool_span!(event.tool_name.as_str(), "pre");
        let _enter = span.enter();

        let mut state = self.lock();
        if state.closed {
            debug!(tool = %event.tool_name, "Pre hook after close ignored");
            return;
        }

        let (agent, attribution) = state.attributor.attribute(event);
        span.record("agent", agent.as_str());

        if event.tool_name == DELEGATION_TOOL {
            let subagent = state.attributor.register_spawn(event.tool_use_id.as_deref(), &event.input);
            let line = self.delegation_line(subagent.as_ref(), &event.input);
            self.announce(&mut state, event.tool_use_id.as_deref(), &line);
            return;
        }

        let label = render::agent_label(&agent, attribution);
        let input = render::preview(&event.input, self.config.input_preview_chars);
        self.announce(&mut state, event.tool_use_id.as_deref(), &render::starting_line(&label, &event.tool_name, &input));

        let seq = state.in_flight.next_seq();
        let call = InFlightCall {
            tool_name: event.tool_name.clone(),
            tool_use_id: event.tool_use_id.clone(),
            input: event.input.clone(),
            agent,
            attribution,
            started_at: event.timestamp,
            seq,
        };

        if let Some(displaced) = state.in_flight.open(call) {
            warn!(tool = %displaced.tool_name, tool_use_id = ?displaced.tool_use_id, "Tool-use id reused before completion");
            let label = render::agent_label(&displaced.agent, displaced.attribution);
            self.transcript.write_line(&render::superseded_line(&label, &displaced.tool_name));
            let record = Self::record_for(RecordStatus::Superseded, &displaced).with_ended_at(event.timestamp);
            self.append(&mut state, record);
        }
    }

    fn handle_post(&self, event: &ToolInvocationEvent) {
        let span = tool_span!(event.tool_name.as_str(), "post");
        let _enter = span.enter();

        let mut state = self.lock();
        if state.closed {
            debug!(tool = %event.tool_name, "Post hook after close ignored");
            return;
        }

        if let Some(id) = &event.tool_use_id {
            state.announced.remove(id);
        }

        if event.tool_name == DELEGATION_TOOL {
            let subagent = event.tool_use_id.as_deref().and_then(|id| state.attributor.release_spawn(id));
            debug!(subagent = ?subagent, is_error = event.is_error, "Delegation finished");
            return;
        }

        let output = event.output.clone().unwrap_or(Value::Null);
        let output_preview = render::preview(&output, self.config.output_preview_chars);

        let record = match state.in_flight.close(&event.tool_name, event.tool_use_id.as_deref()) {
            Some(call) => {
                span.record("agent", call.agent.as_str());
                let record = Self::record_for(RecordStatus::Completed, &call)
                    .with_output(output, event.is_error)
                    .with_ended_at(event.timestamp);
                let label = render::agent_label(&call.agent, call.attribution);
                self.transcript.write_line(&render::completed_line(
                    &label,
                    &call.tool_name,
                    record.duration_ms,
                    &output_preview,
                    event.is_error,
                ));
                record
            }
            None => {
                warn!(tool = %event.tool_name, tool_use_id = ?event.tool_use_id, "Completion with no matching start");
                self.transcript.write_line(&render::unmatched_line(&event.tool_name, &output_preview));
                ToolCallRecord::new(
                    RecordStatus::Unmatched,
                    AgentIdentity::Unknown,
                    Attribution::Unmatched,
                    event.tool_name.clone(),
                )
                .with_tool_use_id(event.tool_use_id.clone())
                .with_input(event.input.clone())
                .with_output(output, event.is_error)
                .with_ended_at(event.timestamp)
            }
        };

        self.append(&mut state, record);
    }

    /// Write `line` unless the call with this id already has one.
    fn announce(&self, state: &mut TrackerState, tool_use_id: Option<&str>, line: &str) {
        let fresh = match tool_use_id {
            Some(id) => state.announced.insert(id.to_string()),
            None => true,
        };
        if fresh {
            self.transcript.write_line(line);
        }
    }

    fn delegation_line(&self, subagent: Option<&AgentIdentity>, input: &Value) -> String {
        let target = subagent.map_or_else(|| AgentIdentity::Unknown.to_string(), ToString::to_string);
        let description = input.get("description").cloned().unwrap_or(Value::Null);
        render::delegation_line(&target, &render::preview(&description, self.config.input_preview_chars))
    }

    fn record_for(status: RecordStatus, call: &InFlightCall) -> ToolCallRecord {
        ToolCallRecord::new(status, call.agent.clone(), call.attribution, call.tool_name.clone())
            .with_tool_use_id(call.tool_use_id.clone())
            .with_input(call.input.clone())
            .with_started_at(call.started_at)
    }

    fn append(&self, state: &mut TrackerState, record: ToolCallRecord) {
        state.stats.count(&record);
        self.event_log.append(&record);
    }

    /// Run a hook body, swallowing any panic so the runtime never sees one.
    fn guarded(&self, phase: &'static str, tool: &str, body: impl FnOnce()) {
        if panic::catch_unwind(AssertUnwindSafe(body)).is_err() {
            error!(phase, tool, "Tool hook panicked; event skipped");
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ToolHook for SubagentTracker {
    fn on_pre_tool_use(&self, event: &ToolInvocationEvent) {
        SubagentTracker::on_pre_tool_use(self, event);
    }

    fn on_post_tool_use(&self, event: &ToolInvocationEvent) {
        SubagentTracker::on_post_tool_use(self, event);
    }
}

impl Drop for SubagentTracker {
    fn drop(&mut self) {
        self.close();
    }
}
