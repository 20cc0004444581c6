//! CLI argument definitions for bucket-relay.

use br_cli_common::LogLevel;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Copy or download S3 objects selected by key pattern and modification time.
///
/// Lists the source bucket, keeps objects whose key matches `--key-pattern`
/// and whose last-modified time falls inside `[--start-time, --end-time]`,
/// then copies them to `--destination-bucket` and/or downloads them into
/// `--destination-folder`. Successful transfers are appended to the audit log.
///
/// ## Examples
///
/// Preview January's CSV files:
///   bucket-relay --source-bucket logs --key-pattern '\.csv$' \
///       --start-time 2024-01-01 --end-time 2024-01-31T23:59:59 --dry-run
///
/// Copy the last day of objects into a backup bucket:
///   bucket-relay --source-bucket logs --destination-bucket backup \
///       --prefix "2024/" --start-time -1d
///
/// Download with a separate profile and higher concurrency:
///   bucket-relay --source-bucket logs --source-profile prod \
///       --destination-folder ./out --start-time yesterday --max-concurrency 32
#[derive(Parser, Debug)]
#[command(name = "bucket-relay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    // === Source ===
    /// Bucket to list and transfer from
    #[arg(long, env = "BR_SOURCE_BUCKET")]
    pub source_bucket: String,

    /// Credential profile for the source bucket
    #[arg(long)]
    pub source_profile: Option<String>,

    // === Destinations ===
    /// Bucket to copy matching objects into
    #[arg(long)]
    pub destination_bucket: Option<String>,

    /// Credential profile for the destination bucket
    #[arg(long)]
    pub destination_profile: Option<String>,

    /// Prepended to each key in the destination bucket
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Local folder to download matching objects into
    #[arg(long)]
    pub destination_folder: Option<PathBuf>,

    // === Filters ===
    /// Regular expression searched for anywhere in the key
    #[arg(long, default_value = ".*")]
    pub key_pattern: String,

    /// Start of the modification window (inclusive)
    ///
    /// Accepts ISO 8601 timestamps, dates, `now`, `today`, `yesterday`,
    /// shorthand like `-24h` or `-7d`, and phrases like `3 days ago`.
    /// Times without an offset are UTC.
    #[arg(long, allow_hyphen_values = true)]
    pub start_time: String,

    /// End of the modification window (inclusive, default: now)
    #[arg(long, allow_hyphen_values = true)]
    pub end_time: Option<String>,

    // === Execution ===
    /// List and print matching objects without transferring
    #[arg(long)]
    pub dry_run: bool,

    /// Maximum transfers in flight (must be >= 1)
    #[arg(long, default_value = "10", value_parser = parse_positive_usize)]
    pub max_concurrency: usize,

    /// Output format for --dry-run
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormatArg,

    // === AWS ===
    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Custom S3 endpoint URL (for LocalStack)
    #[arg(long, env = "BR_S3_ENDPOINT")]
    pub endpoint: Option<String>,

    // === Logging ===
    /// File receiving one line per successful transfer
    #[arg(long, default_value = br_relay::audit::DEFAULT_AUDIT_LOG)]
    pub audit_log: PathBuf,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

/// Output format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    /// `<last_modified>\t<key>`
    Text,
    /// JSON Lines (one JSON object per line)
    Jsonl,
    /// Pretty-printed JSON
    Json,
}

impl From<OutputFormatArg> for br_relay::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Text => br_relay::OutputFormat::Text,
            OutputFormatArg::Jsonl => br_relay::OutputFormat::Jsonl,
            OutputFormatArg::Json => br_relay::OutputFormat::Json,
        }
    }
}

/// Parse a positive usize (>= 1).
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value < 1 {
        return Err(format!("{} is not in 1..", value));
    }
    Ok(value)
}
