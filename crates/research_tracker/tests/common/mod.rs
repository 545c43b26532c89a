//! Shared fixtures for tracker integration tests.

use std::sync::Arc;

use research_core::{AgentRoster, SubagentDefinition};
use research_tracker::{MessageStreamProcessor, SessionContext, SubagentTracker, TrackerConfig, TranscriptSink};
use tempfile::TempDir;

pub struct Harness {
    // Keeps the session directory alive for the test's duration.
    _base: TempDir,
    pub session: SessionContext,
    pub transcript: Arc<TranscriptSink>,
    pub tracker: Arc<SubagentTracker>,
    pub processor: MessageStreamProcessor,
}

impl Harness {
    pub fn new() -> Self {
        let base = tempfile::tempdir().unwrap();
        let session = SessionContext::create(base.path()).unwrap();
        let transcript = Arc::new(TranscriptSink::open(&session.transcript_path).unwrap().without_console());
        let tracker = Arc::new(
            SubagentTracker::for_session(&session, Arc::clone(&transcript), roster(), TrackerConfig::default())
                .unwrap(),
        );
        let processor = MessageStreamProcessor::new(Arc::clone(&tracker));
        Self {
            _base: base,
            session,
            transcript,
            tracker,
            processor,
        }
    }

    pub fn finish(&self) {
        self.tracker.close();
        self.transcript.close();
    }

    pub fn transcript_text(&self) -> String {
        std::fs::read_to_string(&self.session.transcript_path).unwrap()
    }

    pub fn records(&self) -> Vec<research_core::ToolCallRecord> {
        research_tracker::read_records(&self.session.tool_log_path).unwrap()
    }
}

/// The three research subagents with their permitted tools.
pub fn roster() -> AgentRoster {
    AgentRoster::new()
        .with_agent(SubagentDefinition::new("researcher", "Gathers sources").with_tools(["WebSearch", "Write"]))
        .with_agent(
            SubagentDefinition::new("data-analyst", "Builds charts").with_tools(["Glob", "Read", "Bash", "Write"]),
        )
        .with_agent(
            SubagentDefinition::new("report-writer", "Writes the PDF").with_tools(["Skill", "Write", "Glob", "Read", "Bash"]),
        )
}

/// Asserts each needle occurs in `haystack`, in the given order.
#[allow(dead_code)]
pub fn assert_in_order(haystack: &str, needles: &[&str]) {
    let mut from = 0;
    for needle in needles {
        match haystack[from..].find(needle) {
            Some(pos) => from += pos + needle.len(),
            None => panic!("{needle:?} missing or out of order in:\n{haystack}"),
        }
    }
}
