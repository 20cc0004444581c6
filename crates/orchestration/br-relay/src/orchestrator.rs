//! Batch orchestration: list, then either print or transfer.

use br_error::Result;
use std::sync::Arc;
use tracing::{debug, info};

use crate::ObjectRecord;
use crate::config::RunConfig;
use crate::dispatcher::Dispatcher;
use crate::filter::KeyFilter;
use crate::lister::Lister;
use crate::output::Output;
use crate::reporter::OutcomeReporter;
use crate::slots::SlotPool;
use crate::stats::RunStats;
use crate::store::{ObjectStore, SessionFactory, TransferStores};
use crate::task::{CopyTask, DownloadTask, TransferTask};

/// How a run ended.
#[derive(Debug, Clone)]
pub enum RunReport {
    /// No object passed the filters
    Empty,

    /// Matching objects were printed and nothing was transferred
    DryRun { records: usize },

    /// Transfers were dispatched
    Completed(RunStats),
}

/// Build the transfer tasks for a matched listing.
///
/// One copy task per record when a destination bucket is configured and one
/// download task per record when a destination folder is configured. With
/// neither configured the result is empty.
pub fn build_tasks(records: &[ObjectRecord], config: &RunConfig) -> Vec<TransferTask> {
    let mut tasks = Vec::new();

    for record in records {
        if let Some(destination) = &config.destination_container {
            tasks.push(
                CopyTask::new(
                    &config.source_container,
                    &record.key,
                    destination,
                    &config.prefix,
                )
                .with_size(record.size)
                .into(),
            );
        }
        if let Some(folder) = &config.destination_folder {
            tasks.push(DownloadTask::new(&config.source_container, &record.key, folder).into());
        }
    }

    tasks
}

/// Drives one relay run.
///
/// The listing session is opened through the [`SessionFactory`] at the start
/// of [`run`](Self::run). Transfer sessions are opened only when tasks need
/// them and are dropped when dispatch ends.
pub struct BatchOrchestrator<O: Output> {
    config: RunConfig,
    sessions: Arc<dyn SessionFactory>,
    reporter: OutcomeReporter,
    output: O,
    filter: KeyFilter,
    slots: SlotPool,
}

impl<O: Output> BatchOrchestrator<O> {
    /// Create an orchestrator.
    ///
    /// Validates the configuration and compiles the key pattern, so a bad
    /// pattern fails here before any I/O.
    pub fn new(
        config: RunConfig,
        sessions: Arc<dyn SessionFactory>,
        reporter: OutcomeReporter,
        output: O,
    ) -> Result<Self> {
        config.validate()?;
        let filter = KeyFilter::new(&config.key_pattern, config.window)?;
        let slots = SlotPool::new(config.max_concurrency)?;

        Ok(Self {
            config,
            sessions,
            reporter,
            output,
            filter,
            slots,
        })
    }

    /// Get the run configuration.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Execute the run.
    pub async fn run(&self) -> Result<RunReport> {
        let mut stats = RunStats::new();

        debug!(
            bucket = %self.config.source_container,
            filter = %self.filter.description(),
            dry_run = self.config.dry_run,
            "Starting run"
        );

        let source = self.sessions.open(&self.config.source_session()).await?;
        let lister = Lister::new(
            Arc::clone(&source),
            &self.config.source_container,
            self.filter.clone(),
        );
        let records = lister.collect().await?;

        if records.is_empty() {
            info!("No objects matched the criteria");
            return Ok(RunReport::Empty);
        }
        stats.record_matched(&records);
        info!(
            records = stats.records_matched,
            bytes = stats.bytes_matched,
            "Listing completed"
        );

        if self.config.dry_run {
            for record in &records {
                self.output.output(record).await?;
            }
            self.output.flush().await?;
            return Ok(RunReport::DryRun {
                records: records.len(),
            });
        }

        let tasks = build_tasks(&records, &self.config);
        drop(records);

        if tasks.is_empty() {
            info!("No destination bucket or folder configured, nothing to transfer");
        } else {
            let stores = self.open_stores(source).await?;
            let dispatcher = Dispatcher::new(self.slots.clone());
            let dispatch = dispatcher
                .run(tasks, &stores, |outcome| self.reporter.report(&outcome))
                .await?;
            stats.record_dispatch(&dispatch);
        }

        stats.complete();
        info!(
            succeeded = stats.transfers_succeeded,
            failed = stats.transfers_failed,
            "Run completed"
        );

        Ok(RunReport::Completed(stats))
    }

    /// Open the sessions the configured destinations need.
    ///
    /// Downloads reuse the listing session, copies get a session under the
    /// destination profile.
    async fn open_stores(&self, source: Arc<dyn ObjectStore>) -> Result<TransferStores> {
        let mut stores = TransferStores::new();

        if self.config.downloads() {
            stores = stores.with_source(source);
        }
        if self.config.copies() {
            let destination = self
                .sessions
                .open(&self.config.destination_session())
                .await?;
            stores = stores.with_destination(destination);
        }

        Ok(stores)
    }
}
