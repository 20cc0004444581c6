//! Transfer tasks: remote copy and local download.

use br_error::{RelayError, Result, TransferError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::reporter::OutcomeRecord;
use crate::s3_uri;
use crate::slots::SlotPool;
use crate::store::TransferStores;

/// Characters that are not allowed in filenames on common filesystems.
const DISALLOWED_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Turn an object key into a filesystem-safe filename.
///
/// Each disallowed character (`< > : " / \ | ? *`) becomes `_` and
/// surrounding whitespace is trimmed. Directory separators are replaced too,
/// so keys that differ only in separators map to the same filename.
///
/// ```
/// use br_relay::sanitize_filename;
///
/// assert_eq!(sanitize_filename("a/b:c.txt"), "a_b_c.txt");
/// assert_eq!(sanitize_filename("a_b_c.txt"), "a_b_c.txt");
/// ```
pub fn sanitize_filename(key: &str) -> String {
    key.replace(DISALLOWED_FILENAME_CHARS, "_").trim().to_string()
}

/// Kind of transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    Copy,
    Download,
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => write!(f, "copy"),
            Self::Download => write!(f, "download"),
        }
    }
}

/// What a task transfers, for logs and outcome records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescription {
    pub kind: TransferKind,

    /// Source as `s3://bucket/key`
    pub source: String,

    /// Destination as `s3://bucket/key` or a local path
    pub destination: String,
}

impl fmt::Display for TaskDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} to {}", self.kind, self.source, self.destination)
    }
}

/// Copy an object into another bucket at `prefix + key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTask {
    pub source_container: String,
    pub source_key: String,
    pub destination_container: String,
    pub destination_key: String,

    /// Source object size in bytes, as listed
    pub size: u64,
}

impl CopyTask {
    /// Create a copy task. The destination key is `prefix` followed by the
    /// unmodified source key.
    pub fn new(
        source_container: impl Into<String>,
        source_key: impl Into<String>,
        destination_container: impl Into<String>,
        prefix: &str,
    ) -> Self {
        let source_key = source_key.into();
        Self {
            destination_key: format!("{prefix}{source_key}"),
            source_container: source_container.into(),
            source_key,
            destination_container: destination_container.into(),
            size: 0,
        }
    }

    /// Set the source object size.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    fn describe(&self) -> TaskDescription {
        TaskDescription {
            kind: TransferKind::Copy,
            source: s3_uri(&self.source_container, &self.source_key),
            destination: s3_uri(&self.destination_container, &self.destination_key),
        }
    }

    async fn execute(&self, stores: &TransferStores, slots: &SlotPool) -> Result<OutcomeRecord> {
        let store = stores
            .destination
            .as_ref()
            .ok_or_else(|| RelayError::Dispatch("copy task without a destination session".into()))?;

        let _slot = slots.acquire().await?;
        debug!(
            source = %s3_uri(&self.source_container, &self.source_key),
            destination = %s3_uri(&self.destination_container, &self.destination_key),
            "Copying"
        );

        let result = store
            .copy(
                &self.source_container,
                &self.source_key,
                &self.destination_container,
                &self.destination_key,
                self.size,
            )
            .await;

        Ok(OutcomeRecord::from_result(self.describe(), result))
    }
}

/// Download an object into a local folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub source_container: String,
    pub source_key: String,
    pub destination_folder: PathBuf,
    pub destination_path: PathBuf,
}

impl DownloadTask {
    /// Create a download task writing to `folder/<sanitized key>`.
    pub fn new(
        source_container: impl Into<String>,
        source_key: impl Into<String>,
        folder: impl AsRef<Path>,
    ) -> Self {
        let source_key = source_key.into();
        let folder = folder.as_ref();
        Self {
            destination_path: folder.join(sanitize_filename(&source_key)),
            destination_folder: folder.to_path_buf(),
            source_container: source_container.into(),
            source_key,
        }
    }

    fn describe(&self) -> TaskDescription {
        TaskDescription {
            kind: TransferKind::Download,
            source: s3_uri(&self.source_container, &self.source_key),
            destination: self.destination_path.display().to_string(),
        }
    }

    async fn execute(&self, stores: &TransferStores, slots: &SlotPool) -> Result<OutcomeRecord> {
        let store = stores
            .source
            .as_ref()
            .ok_or_else(|| RelayError::Dispatch("download task without a source session".into()))?;

        let _slot = slots.acquire().await?;
        debug!(
            source = %s3_uri(&self.source_container, &self.source_key),
            destination = %self.destination_path.display(),
            "Downloading"
        );

        let result = async {
            tokio::fs::create_dir_all(&self.destination_folder)
                .await
                .map_err(TransferError::from)?;
            store
                .download(&self.source_container, &self.source_key, &self.destination_path)
                .await
        }
        .await;

        Ok(OutcomeRecord::from_result(self.describe(), result))
    }
}

/// A single unit of transfer work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferTask {
    Copy(CopyTask),
    Download(DownloadTask),
}

impl TransferTask {
    /// Run the task once, holding one slot for the duration of the I/O.
    ///
    /// Transfer failures are returned as a failed [`OutcomeRecord`]. A fatal
    /// `Err` means the dispatcher itself is broken (closed slot pool, missing
    /// session) and the batch must stop.
    pub async fn execute(&self, stores: &TransferStores, slots: &SlotPool) -> Result<OutcomeRecord> {
        match self {
            Self::Copy(task) => task.execute(stores, slots).await,
            Self::Download(task) => task.execute(stores, slots).await,
        }
    }

    /// Describe the source and destination of this task.
    pub fn describe(&self) -> TaskDescription {
        match self {
            Self::Copy(task) => task.describe(),
            Self::Download(task) => task.describe(),
        }
    }

    /// Get the transfer kind.
    pub fn kind(&self) -> TransferKind {
        match self {
            Self::Copy(_) => TransferKind::Copy,
            Self::Download(_) => TransferKind::Download,
        }
    }
}

impl From<CopyTask> for TransferTask {
    fn from(task: CopyTask) -> Self {
        Self::Copy(task)
    }
}

impl From<DownloadTask> for TransferTask {
    fn from(task: DownloadTask) -> Self {
        Self::Download(task)
    }
}
