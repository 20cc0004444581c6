//! Dry-run output of matching objects.
//!
//! This module provides the [`Output`] trait and [`StdoutOutput`], which
//! prints each matching object as a tab-separated line, JSONL or pretty JSON.

mod stdout;

pub use stdout::{OutputFormat, StdoutOutput, format_record};

use async_trait::async_trait;
use br_error::Result;

use crate::ObjectRecord;

/// Destination for the records listed by a dry run.
#[async_trait]
pub trait Output: Send + Sync {
    /// Output a single record.
    async fn output(&self, record: &ObjectRecord) -> Result<()>;

    /// Flush any buffered output.
    async fn flush(&self) -> Result<()>;
}
