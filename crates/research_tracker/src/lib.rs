//! Session tracking for the research agent.
//!
//! A session owns two sinks: the human-readable transcript and the JSONL tool
//! call log. The [`SubagentTracker`] feeds both from the runtime's tool hooks,
//! and the [`MessageStreamProcessor`] interleaves the lead agent's text with
//! the tracker's lines as the response streams in.

pub mod attribution;
pub mod config;
pub mod error;
pub mod event_log;
pub mod inflight;
pub mod processor;
pub mod render;
pub mod session;
pub mod tracker;
pub mod transcript;

pub use attribution::Attributor;
pub use config::TrackerConfig;
pub use error::{Result, TrackerError};
pub use event_log::{read_records, EventLog};
pub use inflight::{InFlightCall, InFlightTable};
pub use processor::{MessageStreamProcessor, TurnOutcome};
pub use session::{SessionContext, DEBUG_LOG_FILE, TOOL_LOG_FILE, TRANSCRIPT_FILE};
pub use tracker::{SubagentTracker, TrackerStats};
pub use transcript::TranscriptSink;
