//! Parsing of free-form start/end time expressions.

use br_error::{RelayError, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%d %B %Y %H:%M:%S",
    "%d %B %Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

// `%B` also accepts abbreviated month names, in any case.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%m/%d/%Y",
];

/// Parse a time expression into a UTC timestamp.
///
/// `now` anchors the relative forms, so a run resolves every expression
/// against the same instant.
///
/// Supported formats:
/// - RFC 3339: `2024-01-15T10:30:00Z`, `2024-01-15T10:30:00+02:00` (converted to UTC)
/// - Naive date-time: `2024-01-15T10:30:00`, `2024-01-15 10:30` (assumed UTC)
/// - Date only: `2024-01-15`, `2024/01/15` (midnight UTC)
/// - Month names: `January 15, 2024`, `15 Jan 2024`, `Jan 15 2024 10:30`
/// - US numeric, month first: `01/15/2024`, `1/15/2024 10:30`
/// - Keywords: `now`, `today`, `yesterday`
/// - Relative: `-24h`, `-7d`, `-2w`, `-30m`, `3 days ago`, `a week ago`
pub fn parse_time_expression(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let text = input.trim();
    if text.is_empty() {
        return Err(RelayError::invalid_time(input, "empty expression"));
    }

    let lower = text.to_ascii_lowercase();
    match lower.as_str() {
        "now" => return Ok(now),
        "today" => return Ok(start_of_day(now)),
        "yesterday" => return Ok(start_of_day(now) - Duration::days(1)),
        _ => {}
    }

    if let Some(shorthand) = lower.strip_prefix('-') {
        return parse_shorthand(shorthand)
            .map(|duration| now - duration)
            .map_err(|reason| RelayError::invalid_time(input, reason));
    }

    if let Some(phrase) = lower.strip_suffix(" ago") {
        return parse_phrase(phrase)
            .map(|duration| now - duration)
            .map_err(|reason| RelayError::invalid_time(input, reason));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Ok(midnight.and_utc());
            }
        }
    }

    Err(RelayError::invalid_time(
        input,
        "expected ISO 8601 (2024-01-15T10:30:00Z), a date (2024-01-15, January 15, 2024, \
         01/15/2024), a keyword (now, today, yesterday) or relative (-24h, 3 days ago)",
    ))
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}

/// Parse "24h", "7d", "2w", "30m".
fn parse_shorthand(input: &str) -> std::result::Result<Duration, String> {
    if input.is_empty() {
        return Err("empty relative time".to_string());
    }

    let split = input.char_indices().last().map_or(0, |(i, _)| i);
    let (num_str, unit) = input.split_at(split);
    let amount: i64 = num_str
        .parse()
        .map_err(|_| format!("invalid number in relative time: '{num_str}'"))?;

    unit_duration(unit, amount)
        .ok_or_else(|| format!("invalid relative time unit '{unit}', use m, h, d or w"))
}

/// Parse "3 days", "a week", "an hour", "12 hours".
fn parse_phrase(input: &str) -> std::result::Result<Duration, String> {
    let mut parts = input.split_whitespace();
    let (Some(num_str), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err("expected '<number> <unit> ago'".to_string());
    };

    let amount: i64 = match num_str {
        "a" | "an" => 1,
        _ => num_str
            .parse()
            .map_err(|_| format!("invalid number in relative time: '{num_str}'"))?,
    };

    unit_duration(unit, amount).ok_or_else(|| format!("unknown time unit '{unit}'"))
}

fn unit_duration(unit: &str, amount: i64) -> Option<Duration> {
    match unit {
        "m" | "min" | "mins" | "minute" | "minutes" => Duration::try_minutes(amount),
        "h" | "hour" | "hours" => Duration::try_hours(amount),
        "d" | "day" | "days" => Duration::try_days(amount),
        "w" | "week" | "weeks" => Duration::try_weeks(amount),
        _ => None,
    }
}
