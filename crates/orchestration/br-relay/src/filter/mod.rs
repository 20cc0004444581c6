//! Key and modification-time filtering.
//!
//! An object is selected when its key matches the configured regular
//! expression and its UTC-normalized last-modified time lies inside the
//! [`TimeWindow`].
//!
//! # Examples
//!
//! ```
//! use br_relay::filter::{KeyFilter, TimeWindow};
//! use chrono::{TimeZone, Utc};
//!
//! let window = TimeWindow::new(
//!     Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
//!     Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 0).unwrap(),
//! );
//! let filter = KeyFilter::new(r".*\.csv$", window).unwrap();
//!
//! assert!(filter.matches("2024/data.csv", Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()));
//! assert!(!filter.matches("2024/data.csv", Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()));
//! ```

mod key;
mod time;
mod window;

pub use key::{KeyFilter, MATCH_ALL_PATTERN, compile_pattern, matches};
pub use time::parse_time_expression;
pub use window::{RawTimestamp, TimeWindow};
