//! Statistics for relay runs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::ObjectRecord;
use crate::dispatcher::DispatchStats;

/// Statistics collected during a relay run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// When the run started
    pub started_at: Option<DateTime<Utc>>,

    /// When the run completed
    pub completed_at: Option<DateTime<Utc>>,

    /// Objects that passed the key and time filters
    pub records_matched: usize,

    /// Total bytes of matched objects
    pub bytes_matched: u64,

    /// Transfer tasks built from the matched objects
    pub tasks_built: usize,

    /// Transfers that succeeded
    pub transfers_succeeded: usize,

    /// Transfers that failed
    pub transfers_failed: usize,

    /// Highest number of transfers in flight at once
    pub peak_in_flight: usize,
}

impl RunStats {
    /// Create a new stats tracker with the current time as start time.
    pub fn new() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Mark the run as complete with the current time.
    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Record the matched listing.
    pub fn record_matched(&mut self, records: &[ObjectRecord]) {
        self.records_matched += records.len();
        self.bytes_matched += records.iter().map(|r| r.size).sum::<u64>();
    }

    /// Record the outcome counts of a dispatch.
    pub fn record_dispatch(&mut self, dispatch: &DispatchStats) {
        self.tasks_built += dispatch.total;
        self.transfers_succeeded += dispatch.succeeded;
        self.transfers_failed += dispatch.failed;
        self.peak_in_flight = self.peak_in_flight.max(dispatch.peak_in_flight);
    }

    /// Check if any transfer failed.
    pub fn has_failures(&self) -> bool {
        self.transfers_failed > 0
    }

    /// Get the duration of the run.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Calculate the throughput in completed transfers per second.
    pub fn transfers_per_second(&self) -> Option<f64> {
        self.duration().map(|d| {
            let secs = d.num_milliseconds() as f64 / 1000.0;
            if secs > 0.0 {
                (self.transfers_succeeded + self.transfers_failed) as f64 / secs
            } else {
                0.0
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::thread::sleep;
    use std::time::Duration as StdDuration;

    fn record(key: &str, size: u64) -> ObjectRecord {
        ObjectRecord {
            key: key.to_string(),
            last_modified: Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap(),
            size,
            storage_class: "STANDARD".to_string(),
        }
    }

    #[test]
    fn test_stats_new() {
        let stats = RunStats::new();
        assert!(stats.started_at.is_some());
        assert!(stats.completed_at.is_none());
        assert_eq!(stats.records_matched, 0);
    }

    #[test]
    fn test_stats_record_matched() {
        let mut stats = RunStats::new();
        stats.record_matched(&[record("a", 1024), record("b", 2048)]);

        assert_eq!(stats.records_matched, 2);
        assert_eq!(stats.bytes_matched, 3072);
    }

    #[test]
    fn test_stats_record_dispatch() {
        let mut stats = RunStats::new();
        assert!(!stats.has_failures());

        stats.record_dispatch(&DispatchStats {
            total: 4,
            succeeded: 3,
            failed: 1,
            peak_in_flight: 2,
        });

        assert_eq!(stats.tasks_built, 4);
        assert_eq!(stats.transfers_succeeded, 3);
        assert_eq!(stats.transfers_failed, 1);
        assert_eq!(stats.peak_in_flight, 2);
        assert!(stats.has_failures());
    }

    #[test]
    fn test_stats_duration() {
        let mut stats = RunStats::new();
        sleep(StdDuration::from_millis(10));
        stats.complete();

        let duration = stats.duration().unwrap();
        assert!(duration.num_milliseconds() >= 10);
        assert!(stats.transfers_per_second().is_some());
    }

    #[test]
    fn test_stats_default() {
        let stats = RunStats::default();
        assert!(stats.started_at.is_none());
        assert!(stats.duration().is_none());
        assert!(stats.transfers_per_second().is_none());
    }
}
