//! Per-transfer outcome reporting.

use br_error::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::audit::AuditSink;
use crate::task::{TaskDescription, TransferKind};

/// Result of one transfer attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub task: TaskDescription,
    pub succeeded: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl OutcomeRecord {
    /// A successful outcome stamped with the current time.
    pub fn success(task: TaskDescription) -> Self {
        Self {
            task,
            succeeded: true,
            error_detail: None,
            timestamp: Utc::now(),
        }
    }

    /// A failed outcome stamped with the current time.
    pub fn failure(task: TaskDescription, detail: impl ToString) -> Self {
        Self {
            task,
            succeeded: false,
            error_detail: Some(detail.to_string()),
            timestamp: Utc::now(),
        }
    }

    /// Convert an operation result into an outcome.
    pub fn from_result<T>(task: TaskDescription, result: Result<T>) -> Self {
        match result {
            Ok(_) => Self::success(task),
            Err(e) => Self::failure(task, e),
        }
    }
}

/// Writes outcomes to the operational trace and the audit sink.
///
/// Successes go to both; failures only to the trace. Reporting never
/// fails: audit write errors are logged and dropped.
#[derive(Clone)]
pub struct OutcomeReporter {
    audit: Arc<dyn AuditSink>,
}

impl OutcomeReporter {
    /// Create a reporter writing audit lines to `audit`.
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self { audit }
    }

    /// Report one outcome.
    pub fn report(&self, outcome: &OutcomeRecord) {
        let task = &outcome.task;

        if outcome.succeeded {
            info!(
                kind = %task.kind,
                source = %task.source,
                destination = %task.destination,
                "{}: {} to {}",
                past_tense(task.kind),
                task.source,
                task.destination
            );

            if let Err(e) = self.audit.append(&audit_line(outcome)) {
                warn!(error = %e, source = %task.source, "Failed to write audit log entry");
            }
        } else {
            let detail = outcome.error_detail.as_deref().unwrap_or("unknown error");
            error!(
                kind = %task.kind,
                source = %task.source,
                destination = %task.destination,
                error = %detail,
                "Error during {} of {} to {}: {}",
                task.kind,
                task.source,
                task.destination,
                detail
            );
        }
    }
}

fn past_tense(kind: TransferKind) -> &'static str {
    match kind {
        TransferKind::Copy => "Copied",
        TransferKind::Download => "Downloaded",
    }
}

/// Format the audit line for a successful outcome.
pub fn audit_line(outcome: &OutcomeRecord) -> String {
    format!(
        "{} - INFO - {}: {} to {}",
        outcome.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        past_tense(outcome.task.kind),
        outcome.task.source,
        outcome.task.destination
    )
}
