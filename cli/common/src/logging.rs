//! Logging initialization utilities.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use crate::LogLevel;

/// Crates whose output is capped at `warn` regardless of the selected level.
const QUIET_CRATES: &[&str] = &["aws_config", "aws_smithy_runtime", "aws_sdk_s3", "hyper"];

/// Build the filter for `level`, quieting the AWS SDK and HTTP stack.
pub fn build_env_filter(level: LogLevel) -> Result<EnvFilter> {
    let level: Level = level.into();
    let mut filter = EnvFilter::new(level.as_str().to_lowercase());

    for name in QUIET_CRATES {
        filter = filter.add_directive(format!("{name}=warn").parse()?);
    }

    Ok(filter)
}

/// Initialize logging with the specified level.
///
/// Logs are written to stderr so stdout remains clean for dry-run output.
pub fn init_logging(level: LogLevel) -> Result<()> {
    fmt::Subscriber::builder()
        .with_env_filter(build_env_filter(level)?)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
}
