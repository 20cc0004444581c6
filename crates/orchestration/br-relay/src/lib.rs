//! br-relay - filtered bulk object transfer for bucket-relay.
//!
//! This crate copies objects between S3 buckets and/or downloads them to a
//! local folder. It supports:
//!
//! - Paginated listing with key-pattern and modification-time filtering
//! - Copy and download transfer tasks
//! - Bounded-concurrency dispatch with per-task failure isolation
//! - Operational tracing plus a durable audit log of successful transfers
//! - Dry runs that only list and print matching objects
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use br_relay::{BatchOrchestrator, FileAuditLog, OutcomeReporter, RunConfig, S3SessionFactory};
//! use br_relay::StdoutOutput;
//!
//! let config = RunConfig::new("source-bucket", window)
//!     .with_destination_container("archive-bucket")
//!     .with_prefix("2024/")
//!     .with_max_concurrency(16);
//!
//! let reporter = OutcomeReporter::new(Arc::new(FileAuditLog::new("file_copy.log")));
//! let orchestrator = BatchOrchestrator::new(
//!     config,
//!     Arc::new(S3SessionFactory),
//!     reporter,
//!     StdoutOutput::default(),
//! )?;
//!
//! let report = orchestrator.run().await?;
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod audit;
pub mod config;
pub mod dispatcher;
pub mod filter;
pub mod lister;
pub mod orchestrator;
pub mod output;
pub mod reporter;
pub mod slots;
pub mod stats;
pub mod store;
pub mod task;

pub use audit::{AuditSink, FileAuditLog};
pub use config::{DEFAULT_MAX_CONCURRENCY, DEFAULT_REGION, RunConfig};
pub use dispatcher::{DispatchStats, Dispatcher};
pub use filter::{KeyFilter, RawTimestamp, TimeWindow, matches, parse_time_expression};
pub use lister::Lister;
pub use orchestrator::{BatchOrchestrator, RunReport, build_tasks};
pub use output::{Output, OutputFormat, StdoutOutput};
pub use reporter::{OutcomeRecord, OutcomeReporter};
pub use slots::{SlotGuard, SlotPool};
pub use stats::RunStats;
pub use store::{
    ListPage, ObjectStore, RawObject, S3SessionFactory, S3Store, SessionConfig, SessionFactory,
    TransferStores,
};
pub use task::{
    CopyTask, DownloadTask, TaskDescription, TransferKind, TransferTask, sanitize_filename,
};

/// An object that passed the key and time filters.
///
/// Produced by the [`Lister`]; immutable for the rest of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Object key within the source bucket
    pub key: String,

    /// Last modified timestamp, normalized to UTC
    pub last_modified: DateTime<Utc>,

    /// Size of the object in bytes
    pub size: u64,

    /// Storage class reported by the provider (e.g. "STANDARD")
    pub storage_class: String,
}

/// Format an `s3://bucket/key` URI.
pub fn s3_uri(bucket: &str, key: &str) -> String {
    format!("s3://{bucket}/{key}")
}
