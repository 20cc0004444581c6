//! Stdout output implementation for dry runs.

use async_trait::async_trait;
use br_error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;

use super::Output;
use crate::ObjectRecord;

/// Output format for stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `<last_modified>\t<key>` (default)
    #[default]
    Text,

    /// JSON Lines format - one JSON object per line
    Jsonl,

    /// Pretty-printed JSON
    Json,
}

/// Timestamp layout of the text format, e.g. `2024-01-05 08:30:00+00:00`.
const TEXT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// Render a record in the given format.
pub fn format_record(record: &ObjectRecord, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Text => format!(
            "{}\t{}",
            record.last_modified.format(TEXT_TIMESTAMP_FORMAT),
            record.key
        ),
        OutputFormat::Jsonl => serde_json::to_string(record)
            .map_err(|e| RelayError::Config(format!("JSON serialization failed: {e}")))?,
        OutputFormat::Json => serde_json::to_string_pretty(record)
            .map_err(|e| RelayError::Config(format!("JSON serialization failed: {e}")))?,
    };
    Ok(rendered)
}

/// Prints records to stdout.
#[derive(Debug, Default)]
pub struct StdoutOutput {
    format: OutputFormat,
}

impl StdoutOutput {
    /// Create a new StdoutOutput with the specified format.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Get the output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

#[async_trait]
impl Output for StdoutOutput {
    async fn output(&self, record: &ObjectRecord) -> Result<()> {
        println!("{}", format_record(record, self.format)?);
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        std::io::stdout()
            .flush()
            .map_err(|e| RelayError::Config(format!("Failed to flush stdout: {e}")))
    }
}
