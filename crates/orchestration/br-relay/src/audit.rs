//! Durable audit log of successful transfers.

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::runtime::{Handle, RuntimeFlavor};

/// Default audit log file name.
pub const DEFAULT_AUDIT_LOG: &str = "file_copy.log";

/// Append-only destination for audit lines.
pub trait AuditSink: Send + Sync {
    /// Append one line. The sink adds the trailing newline.
    fn append(&self, line: &str) -> std::io::Result<()>;
}

/// Audit sink backed by a file opened in append mode.
///
/// The file is created on the first write, so runs without successful
/// transfers leave no file behind. Every line is flushed as it is written.
/// On a multi-threaded tokio runtime the write runs under
/// [`tokio::task::block_in_place`] so other tasks move off the worker.
#[derive(Debug)]
pub struct FileAuditLog {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl FileAuditLog {
    /// Create an audit log at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    /// Get the path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut guard = self.file.lock();
        let file = match guard.take() {
            Some(file) => file,
            None => OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?,
        };
        let file = guard.insert(file);

        writeln!(file, "{line}")?;
        file.flush()
    }
}

impl AuditSink for FileAuditLog {
    fn append(&self, line: &str) -> std::io::Result<()> {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| self.write_line(line))
            }
            _ => self.write_line(line),
        }
    }
}
