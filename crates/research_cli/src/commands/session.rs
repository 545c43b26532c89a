//! The session pipeline shared by `chat` and `replay`.
//!
//! A [`Session`] owns the session directory, the transcript, the tracker and
//! the stream processor. Turns run through [`Session::run_turn`]; whatever
//! happens in between, [`Session::finish`] closes the sinks and prints where
//! the logs went.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use futures::StreamExt;
use research_observability::{agent_span, record_duration, record_error, ObservabilityConfig};
use research_runtime::{responses, AgentRuntime, RuntimeOptions};
use research_tracker::{MessageStreamProcessor, SessionContext, SubagentTracker, TrackerConfig, TranscriptSink, TurnOutcome};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};

use crate::agents;
use crate::output;

/// How a turn ended.
#[derive(Debug)]
pub enum TurnStatus {
    Completed(TurnOutcome),
    Failed,
    Cancelled,
}

pub struct Session {
    ctx: SessionContext,
    transcript: Arc<TranscriptSink>,
    tracker: Arc<SubagentTracker>,
    processor: MessageStreamProcessor,
    cancel: CancellationToken,
}

impl Session {
    /// Create the session directory and wire the sinks together.
    ///
    /// Also installs the debug log subscriber and the Ctrl-C watcher.
    pub fn start(logs_dir: &Path, verbose: bool) -> Result<Self> {
        let ctx = SessionContext::create(logs_dir)
            .with_context(|| format!("Failed to create a session directory under {}", logs_dir.display()))?;
        init_logging(&ctx, verbose);

        let config = TrackerConfig::from_env();
        let transcript = TranscriptSink::open(&ctx.transcript_path)
            .with_context(|| format!("Failed to open {}", ctx.transcript_path.display()))?;
        let transcript = if config.mirror_console && !output::is_json() {
            transcript
        } else {
            transcript.without_console()
        };
        let transcript = Arc::new(transcript);

        let tracker = SubagentTracker::for_session(&ctx, Arc::clone(&transcript), agents::roster(), config)
            .with_context(|| format!("Failed to open {}", ctx.tool_log_path.display()))?;
        let tracker = Arc::new(tracker);
        let processor = MessageStreamProcessor::new(Arc::clone(&tracker));

        let cancel = CancellationToken::new();
        let watcher = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted");
                watcher.cancel();
            }
        });

        info!(session.id = %ctx.id, dir = %ctx.dir.display(), "Session started");
        Ok(Self {
            ctx,
            transcript,
            tracker,
            processor,
            cancel,
        })
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Runtime options for the lead agent with the tracker hooked in for
    /// every tool.
    pub fn runtime_options(&self) -> RuntimeOptions {
        RuntimeOptions::new()
            .with_system_prompt(agents::lead_prompt())
            .with_agents(agents::roster())
            .with_tool_hook(self.tracker.clone())
    }

    /// Send one prompt and stream the response into the transcript.
    ///
    /// Runtime errors are reported and logged here; the session stays usable.
    pub async fn run_turn<R>(&self, runtime: &mut R, prompt: &str) -> TurnStatus
    where
        R: AgentRuntime + ?Sized,
    {
        self.transcript.write_to_file(&format!("\nYou: {prompt}\n"));

        let span = agent_span!(self.ctx.id.as_str(), "turn");
        let started = Instant::now();
        let spinner = output::spinner("Thinking...");
        let mut prefixed = false;

        let turn = async {
            runtime.query(prompt).await?;
            let stream = responses(runtime).inspect(|_| {
                if !prefixed {
                    prefixed = true;
                    spinner.finish_and_clear();
                    self.transcript.write_with_end("\nAgent: ", "");
                }
            });
            self.processor.consume(stream).await
        };

        let result = tokio::select! {
            result = turn.instrument(span.clone()) => Some(result),
            _ = self.cancel.cancelled() => None,
        };
        spinner.finish_and_clear();
        let elapsed = started.elapsed();
        span.in_scope(|| record_duration("turn.duration_ms", elapsed));

        match result {
            None => {
                self.transcript.write("\n[interrupted]");
                TurnStatus::Cancelled
            }
            Some(Ok(outcome)) => {
                if !prefixed {
                    self.transcript.write_with_end("\nAgent: ", "");
                }
                self.transcript.write("\n");
                if outcome.is_error() {
                    output::warning("The agent reported an error for this turn");
                }
                if let Some(result) = &outcome.result {
                    info!(
                        num_turns = result.num_turns,
                        duration_ms = result.duration_ms,
                        wall_ms = elapsed.as_millis() as u64,
                        cost_usd = ?result.total_cost_usd,
                        "Turn complete"
                    );
                }
                TurnStatus::Completed(outcome)
            }
            Some(Err(e)) => {
                span.in_scope(|| record_error(&e));
                self.transcript.write("\n");
                output::error(&format!("Turn failed: {e}"));
                TurnStatus::Failed
            }
        }
    }

    /// Close the runtime and both sinks, then print the session summary.
    ///
    /// The tracker closes before the transcript so its incomplete-call lines
    /// still land in the file.
    pub async fn finish<R>(self, runtime: &mut R)
    where
        R: AgentRuntime + ?Sized,
    {
        if let Err(e) = runtime.close().await {
            warn!(error = %e, "Runtime did not close cleanly");
        }

        self.transcript.write("\n\nGoodbye!");
        self.tracker.close();
        self.transcript.close();

        let stats = self.tracker.summary();
        info!(session.id = %self.ctx.id, calls = stats.total(), "Session closed");

        println!();
        output::header(&format!("Session logs saved to: {}", self.ctx.dir.display()));
        output::kv("Transcript:", &self.ctx.transcript_path.display().to_string());
        output::kv("Tool calls:", &self.ctx.tool_log_path.display().to_string());
        output::kv("Debug log: ", &self.ctx.debug_log_path.display().to_string());
        if stats.total() > 0 {
            output::kv(
                "Recorded:  ",
                &format!(
                    "{} calls ({} completed, {} failed, {} unmatched, {} incomplete, {} superseded)",
                    stats.total(),
                    stats.completed,
                    stats.failed,
                    stats.unmatched,
                    stats.incomplete,
                    stats.superseded
                ),
            );
            if output::is_json() {
                output::data("summary", &stats);
            } else {
                let mut table = output::table();
                output::table_header(&mut table, &["Agent", "Tool calls"]);
                for (agent, count) in &stats.per_agent {
                    output::table_row(&mut table, &[agent.clone(), count.to_string()]);
                }
                println!("{table}");
            }
        }
        if self.transcript.is_degraded() {
            output::warning("The transcript file stopped accepting writes during the session");
        }
        research_observability::shutdown();
    }
}

fn init_logging(ctx: &SessionContext, verbose: bool) {
    let mut config = ObservabilityConfig::from_env()
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_log_file(&ctx.debug_log_path);
    if verbose && config.log_level.is_none() {
        config = config.with_log_level("debug");
    }
    if let Err(e) = research_observability::init(config) {
        output::warning(&format!("Debug log disabled: {e}"));
    }
}
