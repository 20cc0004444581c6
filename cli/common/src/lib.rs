//! Shared utilities for bucket-relay CLI binaries.
//!
//! Log-level selection, stderr logging setup and human-readable formatting
//! for run summaries.

pub mod args;
pub mod format;
pub mod logging;

pub use args::LogLevel;
pub use format::{format_bytes, format_duration, format_number};
pub use logging::{build_env_filter, init_logging};
