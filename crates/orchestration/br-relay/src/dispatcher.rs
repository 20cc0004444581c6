//! Bounded-concurrency execution of transfer tasks.

use br_error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::reporter::OutcomeRecord;
use crate::slots::SlotPool;
use crate::store::TransferStores;
use crate::task::{TaskDescription, TransferTask};

/// Counts from one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStats {
    /// Tasks submitted
    pub total: usize,

    /// Outcomes with `succeeded == true`
    pub succeeded: usize,

    /// Outcomes with `succeeded == false`
    pub failed: usize,

    /// Highest number of slots held at once
    pub peak_in_flight: usize,
}

impl DispatchStats {
    fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    fn record(&mut self, outcome: &OutcomeRecord) {
        if outcome.succeeded {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Number of outcomes produced.
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Settle a finished task into its outcome.
///
/// Recoverable errors become a failed outcome for the task. Fatal errors are
/// returned so the caller can abort the batch.
fn settle(description: TaskDescription, result: Result<OutcomeRecord>) -> Result<OutcomeRecord> {
    match result {
        Ok(outcome) => Ok(outcome),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!(task = %description, error = %e, "Transfer task returned an error");
            Ok(OutcomeRecord::failure(description, e))
        }
    }
}

/// Runs a batch of transfer tasks with at most `capacity` in flight.
///
/// Every task yields exactly one [`OutcomeRecord`]. A failing or panicking
/// task never affects its siblings; only a broken invariant inside the
/// dispatcher aborts the batch.
pub struct Dispatcher {
    slots: SlotPool,
}

impl Dispatcher {
    /// Create a dispatcher drawing from `slots`.
    pub fn new(slots: SlotPool) -> Self {
        Self { slots }
    }

    /// Get the slot pool.
    pub fn slots(&self) -> &SlotPool {
        &self.slots
    }

    /// Run all tasks to completion.
    ///
    /// All tasks are submitted up front and wait for a slot before doing I/O.
    /// `on_outcome` is called for each outcome in completion order.
    pub async fn run<F>(
        &self,
        tasks: Vec<TransferTask>,
        stores: &TransferStores,
        mut on_outcome: F,
    ) -> Result<DispatchStats>
    where
        F: FnMut(OutcomeRecord),
    {
        let mut stats = DispatchStats::new(tasks.len());
        debug!(
            tasks = stats.total,
            max_concurrency = self.slots.capacity(),
            "Dispatching transfers"
        );

        let mut join_set = JoinSet::new();
        let mut pending: HashMap<tokio::task::Id, TaskDescription> =
            HashMap::with_capacity(stats.total);

        for task in tasks {
            let description = task.describe();
            let stores = stores.clone();
            let slots = self.slots.clone();

            let handle = join_set.spawn(async move { task.execute(&stores, &slots).await });
            pending.insert(handle.id(), description);
        }

        while let Some(joined) = join_set.join_next_with_id().await {
            let outcome = match joined {
                Ok((id, result)) => {
                    let description = pending.remove(&id).ok_or_else(|| {
                        RelayError::Dispatch("outcome for an unknown task".to_string())
                    })?;
                    match settle(description, result) {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            error!(error = %e, "Dispatcher failure, aborting batch");
                            join_set.abort_all();
                            return Err(e);
                        }
                    }
                }
                Err(join_error) => {
                    let description = pending.remove(&join_error.id()).ok_or_else(|| {
                        RelayError::Dispatch(format!("unknown task failed: {join_error}"))
                    })?;
                    error!(task = %description, error = %join_error, "Transfer task panicked");
                    OutcomeRecord::failure(description, format!("transfer task aborted: {join_error}"))
                }
            };

            stats.record(&outcome);
            on_outcome(outcome);
        }

        if stats.completed() != stats.total || !pending.is_empty() {
            return Err(RelayError::Dispatch(format!(
                "{} tasks submitted but {} outcomes produced",
                stats.total,
                stats.completed()
            )));
        }

        stats.peak_in_flight = self.slots.peak();
        debug!(
            succeeded = stats.succeeded,
            failed = stats.failed,
            peak_in_flight = stats.peak_in_flight,
            "Dispatch completed"
        );

        Ok(stats)
    }

    /// Run all tasks and collect their outcomes.
    pub async fn run_collect(
        &self,
        tasks: Vec<TransferTask>,
        stores: &TransferStores,
    ) -> Result<Vec<OutcomeRecord>> {
        let mut outcomes = Vec::with_capacity(tasks.len());
        self.run(tasks, stores, |outcome| outcomes.push(outcome))
            .await?;
        Ok(outcomes)
    }
}
