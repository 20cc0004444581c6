//! Concurrency budget shared by transfer tasks.

use br_error::{RelayError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Default)]
struct SlotCounters {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// A counting limiter bounding simultaneous in-flight transfers.
///
/// Cloning is cheap and yields a handle to the same pool. A slot is held
/// through a [`SlotGuard`] and returned when the guard is dropped, on every
/// exit path.
#[derive(Debug, Clone)]
pub struct SlotPool {
    semaphore: Arc<Semaphore>,
    counters: Arc<SlotCounters>,
    capacity: usize,
}

impl SlotPool {
    /// Create a pool with `capacity` slots.
    ///
    /// Returns an error if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(RelayError::Config(
                "max concurrency must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            counters: Arc::new(SlotCounters::default()),
            capacity,
        })
    }

    /// Wait for a free slot.
    pub async fn acquire(&self) -> Result<SlotGuard> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| RelayError::Dispatch(format!("Failed to acquire slot: {e}")))?;

        let in_flight = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        if in_flight > self.capacity {
            self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
            return Err(RelayError::Dispatch(format!(
                "slot accounting violated: {in_flight} in flight with capacity {}",
                self.capacity
            )));
        }
        self.counters.peak.fetch_max(in_flight, Ordering::SeqCst);

        Ok(SlotGuard {
            _permit: permit,
            counters: self.counters.clone(),
        })
    }

    /// Close the pool; pending and future acquisitions fail.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held.
    pub fn in_flight(&self) -> usize {
        self.counters.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of slots held at once since the pool was created.
    pub fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }
}

/// A held slot. Dropping it releases the slot.
#[derive(Debug)]
pub struct SlotGuard {
    _permit: OwnedSemaphorePermit,
    counters: Arc<SlotCounters>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        // Runs before the permit field is dropped, so the next holder is
        // admitted only after this slot has left the count.
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
