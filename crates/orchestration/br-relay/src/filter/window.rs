//! Time windows and timestamp normalization.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive modification-time window, both ends in UTC.
///
/// `start <= end` is not enforced. An inverted window matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window from explicit bounds.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Create a window ending at `end`, or at `now` when no end is given.
    pub fn ending_at_or_now(
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(start, end.unwrap_or(now))
    }

    /// Whether `time` lies within `[start, end]`.
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start <= time && time <= self.end
    }

    /// Whether the window can match anything at all.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Human-readable form used in log fields.
    pub fn description(&self) -> String {
        format!(
            "[{}, {}]",
            self.start.format("%Y-%m-%d %H:%M:%S"),
            self.end.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// A timestamp as reported by a store, before UTC normalization.
///
/// Naive timestamps carry no zone annotation and are taken to be UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTimestamp {
    Naive(NaiveDateTime),
    Aware(DateTime<FixedOffset>),
}

impl RawTimestamp {
    /// Normalize to UTC.
    pub fn to_utc(self) -> DateTime<Utc> {
        match self {
            Self::Naive(naive) => naive.and_utc(),
            Self::Aware(aware) => aware.with_timezone(&Utc),
        }
    }
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(time: DateTime<Utc>) -> Self {
        Self::Aware(time.fixed_offset())
    }
}

impl From<DateTime<FixedOffset>> for RawTimestamp {
    fn from(time: DateTime<FixedOffset>) -> Self {
        Self::Aware(time)
    }
}

impl From<NaiveDateTime> for RawTimestamp {
    fn from(time: NaiveDateTime) -> Self {
        Self::Naive(time)
    }
}
