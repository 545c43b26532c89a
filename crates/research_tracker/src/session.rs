//! Session directory setup.
//!
//! Each run gets `<base>/session_YYYYMMDD_HHMMSS[_n]/` holding the transcript,
//! the tool-call log, and the debug log.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use research_core::SessionId;
use tracing::info;

use crate::error::{Result, TrackerError};

pub const TRANSCRIPT_FILE: &str = "transcript.txt";
pub const TOOL_LOG_FILE: &str = "tool_calls.jsonl";
pub const DEBUG_LOG_FILE: &str = "debug.log";

/// Suffixes tried before giving up on a name collision.
const MAX_SUFFIX: u32 = 1000;

/// Everything a component needs to know about the current session's files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub id: SessionId,
    pub dir: PathBuf,
    pub transcript_path: PathBuf,
    pub tool_log_path: PathBuf,
    pub debug_log_path: PathBuf,
}

impl SessionContext {
    /// Create a fresh session directory under `base_dir` with empty output files.
    pub fn create(base_dir: &Path) -> Result<Self> {
        Self::create_with_id(base_dir, SessionId::new())
    }

    /// Like [`Self::create`] with a caller-chosen id. If a directory with that
    /// name exists (another session started in the same second), `_1`, `_2`, …
    /// are appended until `create_dir` succeeds.
    pub fn create_with_id(base_dir: &Path, id: SessionId) -> Result<Self> {
        fs::create_dir_all(base_dir).map_err(|source| TrackerError::SessionDir {
            path: base_dir.to_path_buf(),
            source,
        })?;

        let mut candidate = id.clone();
        let mut suffix = 0;
        let dir = loop {
            let dir = base_dir.join(candidate.as_str());
            match fs::create_dir(&dir) {
                Ok(()) => break dir,
                Err(e) if e.kind() == ErrorKind::AlreadyExists && suffix < MAX_SUFFIX => {
                    suffix += 1;
                    candidate = id.with_suffix(suffix);
                }
                Err(source) => return Err(TrackerError::SessionDir { path: dir, source }),
            }
        };

        let ctx = Self {
            transcript_path: dir.join(TRANSCRIPT_FILE),
            tool_log_path: dir.join(TOOL_LOG_FILE),
            debug_log_path: dir.join(DEBUG_LOG_FILE),
            id: candidate,
            dir,
        };

        for path in [&ctx.transcript_path, &ctx.tool_log_path] {
            OpenOptions::new().create(true).append(true).open(path)?;
        }

        info!(session.id = %ctx.id, dir = %ctx.dir.display(), "Session directory created");
        Ok(ctx)
    }
}
