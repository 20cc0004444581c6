//! Regex key matching combined with the time window.

use br_error::{RelayError, Result};
use chrono::{DateTime, Utc};
use regex::Regex;

use super::TimeWindow;

/// Pattern used when no key pattern is configured.
pub const MATCH_ALL_PATTERN: &str = ".*";

/// Compile a key pattern.
///
/// Returns [`RelayError::InvalidPattern`] if the expression does not compile.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| RelayError::InvalidPattern(format!("'{pattern}': {e}")))
}

/// Check a key and timestamp against a pattern and window.
///
/// The pattern is searched for anywhere in the key; it does not have to
/// match the whole key. Both window bounds are inclusive.
pub fn matches(
    key: &str,
    last_modified: DateTime<Utc>,
    pattern: &Regex,
    window: &TimeWindow,
) -> bool {
    pattern.is_match(key) && window.contains(last_modified)
}

/// A compiled key pattern paired with a time window.
#[derive(Debug, Clone)]
pub struct KeyFilter {
    pattern: Regex,
    window: TimeWindow,
}

impl KeyFilter {
    /// Compile `pattern` and pair it with `window`.
    pub fn new(pattern: &str, window: TimeWindow) -> Result<Self> {
        Ok(Self::from_regex(compile_pattern(pattern)?, window))
    }

    /// Build a filter from an already compiled pattern.
    pub fn from_regex(pattern: Regex, window: TimeWindow) -> Self {
        Self { pattern, window }
    }

    /// Check whether an object passes the filter.
    pub fn matches(&self, key: &str, last_modified: DateTime<Utc>) -> bool {
        matches(key, last_modified, &self.pattern, &self.window)
    }

    /// Get the source text of the pattern.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Get the time window.
    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    /// Get a human-readable description of this filter.
    pub fn description(&self) -> String {
        format!(
            "key(pattern='{}') and modified{}",
            self.pattern.as_str(),
            self.window.description()
        )
    }
}
