//! Human-readable transcript: file plus live console.
//!
//! Every write goes through one lock, so the file sees segments in exactly the
//! order they were issued. A failed file write drops the file handle and the
//! sink keeps going on the console alone.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;

type Writer = Box<dyn Write + Send>;

struct SinkInner {
    file: Option<Writer>,
    console: Option<Writer>,
    degraded: bool,
    closed: bool,
    /// Line state per destination; console-only and file-only writes diverge.
    file_at_line_start: bool,
    console_at_line_start: bool,
}

pub struct TranscriptSink {
    path: PathBuf,
    inner: Mutex<SinkInner>,
}

impl TranscriptSink {
    /// Open `path` for appending, mirrored to stdout.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self::from_writer(path, file))
    }

    /// Build a sink over an arbitrary writer. `path` is only used in messages.
    pub fn from_writer(path: impl Into<PathBuf>, file: impl Write + Send + 'static) -> Self {
        Self {
            path: path.into(),
            inner: Mutex::new(SinkInner {
                file: Some(Box::new(file)),
                console: Some(Box::new(io::stdout())),
                degraded: false,
                closed: false,
                file_at_line_start: true,
                console_at_line_start: true,
            }),
        }
    }

    /// Replace the console stream (tests capture it; `None` disables mirroring).
    pub fn with_console(self, console: Option<Writer>) -> Self {
        self.lock().console = console;
        self
    }

    pub fn without_console(self) -> Self {
        self.with_console(None)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `text` followed by a newline to file and console.
    pub fn write(&self, text: &str) {
        self.write_with_end(text, "\n");
    }

    /// Append `text` followed by `end` to file and console.
    pub fn write_with_end(&self, text: &str, end: &str) {
        let mut inner = self.lock();
        let segment = format!("{text}{end}");
        inner.emit_file(&self.path, &segment);
        inner.emit_console(&segment);
    }

    /// Write `text` as its own line, breaking the current line first if needed.
    ///
    /// File and console each get the break only when they need it.
    pub fn write_line(&self, text: &str) {
        let mut inner = self.lock();
        let file_lead = if inner.file_at_line_start { "" } else { "\n" };
        inner.emit_file(&self.path, &format!("{file_lead}{text}\n"));
        let console_lead = if inner.console_at_line_start { "" } else { "\n" };
        inner.emit_console(&format!("{console_lead}{text}\n"));
    }

    /// File only. Used for echoing user input the terminal already shows.
    pub fn write_to_file(&self, text: &str) {
        self.lock().emit_file(&self.path, text);
    }

    /// Console only. Used for banners that do not belong in the record.
    pub fn write_to_console(&self, text: &str) {
        self.lock().emit_console(text);
    }

    /// Flush and release the file handle. Later writes reach the console only.
    pub fn close(&self) {
        let mut inner = self.lock();
        if inner.closed {
            return;
        }
        inner.closed = true;
        if let Some(mut file) = inner.file.take() {
            if let Err(e) = file.flush() {
                warn!(path = %self.path.display(), error = %e, "Transcript flush failed on close");
            }
        }
        if let Some(console) = inner.console.as_mut() {
            let _ = console.flush();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// True once a file write has failed and the sink fell back to console only.
    pub fn is_degraded(&self) -> bool {
        self.lock().degraded
    }

    fn lock(&self) -> MutexGuard<'_, SinkInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SinkInner {
    fn emit_file(&mut self, path: &Path, text: &str) {
        if text.is_empty() {
            return;
        }
        let Some(file) = self.file.as_mut() else {
            return;
        };
        match file.write_all(text.as_bytes()).and_then(|()| file.flush()) {
            Ok(()) => self.file_at_line_start = text.ends_with('\n'),
            Err(e) => {
                self.file = None;
                self.degraded = true;
                warn!(path = %path.display(), error = %e, "Transcript file write failed, continuing console-only");
                let notice = format!(
                    "\n[transcript] writing {} failed ({e}); continuing on console only\n",
                    path.display()
                );
                self.emit_console(&notice);
            }
        }
    }

    fn emit_console(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(console) = self.console.as_mut() {
            let _ = console.write_all(text.as_bytes()).and_then(|()| console.flush());
            self.console_at_line_start = text.ends_with('\n');
        }
    }
}

impl Drop for TranscriptSink {
    fn drop(&mut self) {
        self.close();
    }
}
