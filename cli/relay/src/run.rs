//! Main execution logic for the bucket-relay CLI.

use anyhow::Result;
use br_relay::{
    BatchOrchestrator, FileAuditLog, OutcomeReporter, RunConfig, RunReport, S3SessionFactory,
    StdoutOutput, TimeWindow, parse_time_expression,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::args::Cli;

/// Resolve the time window against a single `now`.
fn build_window(args: &Cli, now: DateTime<Utc>) -> Result<TimeWindow> {
    let start = parse_time_expression(&args.start_time, now)?;
    let end = args
        .end_time
        .as_deref()
        .map(|text| parse_time_expression(text, now))
        .transpose()?;

    Ok(TimeWindow::ending_at_or_now(start, end, now))
}

/// Build the run configuration from CLI arguments.
pub fn build_config(args: &Cli, now: DateTime<Utc>) -> Result<RunConfig> {
    let window = build_window(args, now)?;
    if window.is_empty() {
        warn!(window = %window.description(), "Start time is after end time, nothing can match");
    }

    let mut config = RunConfig::new(&args.source_bucket, window)
        .with_key_pattern(&args.key_pattern)
        .with_prefix(&args.prefix)
        .with_dry_run(args.dry_run)
        .with_region(&args.region)
        .with_max_concurrency(args.max_concurrency);

    if let Some(bucket) = &args.destination_bucket {
        config = config.with_destination_container(bucket);
    }
    if let Some(profile) = &args.source_profile {
        config = config.with_source_profile(profile);
    }
    if let Some(profile) = &args.destination_profile {
        config = config.with_destination_profile(profile);
    }
    if let Some(folder) = &args.destination_folder {
        config = config.with_destination_folder(folder);
    }
    if let Some(endpoint) = &args.endpoint {
        config = config.with_endpoint(endpoint);
    }

    config.validate()?;
    Ok(config)
}

/// Execute a relay run with the provided arguments.
pub async fn execute(args: Cli) -> Result<RunReport> {
    let config = build_config(&args, Utc::now())?;
    debug!(
        source = %config.source_container,
        destination_bucket = ?config.destination_container,
        destination_folder = ?config.destination_folder,
        audit_log = %args.audit_log.display(),
        "Configured run"
    );

    let reporter = OutcomeReporter::new(Arc::new(FileAuditLog::new(&args.audit_log)));
    let output = StdoutOutput::new(args.output_format.into());

    let orchestrator = BatchOrchestrator::new(config, Arc::new(S3SessionFactory), reporter, output)?;
    let report = orchestrator.run().await?;

    Ok(report)
}
