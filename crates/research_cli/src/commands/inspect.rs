//! `research-agent inspect`: summarize a session's tool call log.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use research_core::ToolCallRecord;
use research_tracker::render::{agent_label, format_duration, preview};
use research_tracker::{read_records, TOOL_LOG_FILE};
use serde::Serialize;

use crate::output;

const OUTPUT_PREVIEW_CHARS: usize = 60;

/// Per-status and per-agent counts over a set of records.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct LogSummary {
    pub total: usize,
    pub errors: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_agent: BTreeMap<String, usize>,
}

impl LogSummary {
    pub fn from_records(records: &[ToolCallRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Self::default()
        };
        for record in records {
            *summary.by_status.entry(record.status.as_str().to_string()).or_default() += 1;
            *summary.by_agent.entry(record.agent.as_str().to_string()).or_default() += 1;
            if record.is_error {
                summary.errors += 1;
            }
        }
        summary
    }
}

/// Accept either the log file itself or the session directory holding it.
fn resolve_log_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(TOOL_LOG_FILE)
    } else {
        path.to_path_buf()
    }
}

pub fn handle(path: &Path) -> Result<()> {
    let log_path = resolve_log_path(path);
    let records = read_records(&log_path).with_context(|| format!("Failed to read {}", log_path.display()))?;

    output::header(&format!("{} ({} records)", log_path.display(), records.len()));

    let mut table = output::table();
    output::table_header(&mut table, &["#", "Status", "Agent", "Tool", "Duration", "Output"]);
    for (idx, record) in records.iter().enumerate() {
        let duration = record.duration_ms.map(format_duration).unwrap_or_else(|| "-".to_string());
        let output_preview = record
            .output
            .as_ref()
            .map(|out| preview(out, OUTPUT_PREVIEW_CHARS))
            .unwrap_or_default();
        let status = if record.is_error {
            format!("{} (error)", record.status.as_str())
        } else {
            record.status.as_str().to_string()
        };
        output::table_row(
            &mut table,
            &[
                (idx + 1).to_string(),
                status,
                agent_label(&record.agent, record.attribution),
                record.tool.clone(),
                duration,
                output_preview,
            ],
        );
    }
    output::table_print(&table, "records", &records);

    let summary = LogSummary::from_records(&records);
    if output::is_json() {
        output::data("summary", &summary);
    } else {
        for (status, count) in &summary.by_status {
            output::kv(&format!("{status}:"), &count.to_string());
        }
        for (agent, count) in &summary.by_agent {
            output::kv(&format!("[{agent}]"), &format!("{count} call(s)"));
        }
        if summary.errors > 0 {
            output::warning(&format!("{} call(s) reported an error", summary.errors));
        }
    }
    Ok(())
}
