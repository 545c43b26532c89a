//! Append-only JSONL log of tool-call records.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use research_core::ToolCallRecord;
use tracing::{debug, warn};

use crate::error::{Result, TrackerError};

struct LogInner {
    writer: Option<Box<dyn Write + Send>>,
    closed: bool,
    written: u64,
    dropped: u64,
}

/// One self-contained JSON object per line. Earlier lines are never touched.
pub struct EventLog {
    path: PathBuf,
    inner: Mutex<LogInner>,
}

impl EventLog {
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self::from_writer(path, file))
    }

    pub fn from_writer(path: impl Into<PathBuf>, writer: impl Write + Send + 'static) -> Self {
        Self {
            path: path.into(),
            inner: Mutex::new(LogInner {
                writer: Some(Box::new(writer)),
                closed: false,
                written: 0,
                dropped: 0,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize `record` and append it as a single line.
    ///
    /// After the first failed write the log stops writing and only counts
    /// what it drops.
    pub fn append(&self, record: &ToolCallRecord) {
        let mut guard = self.lock();
        let inner = &mut *guard;

        let Some(writer) = inner.writer.as_mut() else {
            inner.dropped += 1;
            return;
        };

        let mut line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(e) => {
                warn!(tool = %record.tool, error = %e, "Failed to serialize tool-call record");
                inner.dropped += 1;
                return;
            }
        };
        line.push('\n');

        match writer.write_all(line.as_bytes()).and_then(|()| writer.flush()) {
            Ok(()) => {
                inner.written += 1;
                debug!(tool = %record.tool, status = record.status.as_str(), "Tool-call record appended");
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Event log write failed, further records will be dropped");
                inner.writer = None;
                inner.dropped += 1;
            }
        }
    }

    /// Flush and release the file. Safe to call more than once.
    pub fn close(&self) {
        let mut inner = self.lock();
        if inner.closed {
            return;
        }
        inner.closed = true;
        if let Some(mut writer) = inner.writer.take() {
            if let Err(e) = writer.flush() {
                warn!(path = %self.path.display(), error = %e, "Event log flush failed on close");
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn records_written(&self) -> u64 {
        self.lock().written
    }

    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }

    fn lock(&self) -> MutexGuard<'_, LogInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for EventLog {
    fn drop(&mut self) {
        self.close();
    }
}

/// Parse a log written by [`EventLog`]. Blank lines are skipped.
pub fn read_records(path: &Path) -> Result<Vec<ToolCallRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| TrackerError::MalformedRecord {
            line: idx + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}
