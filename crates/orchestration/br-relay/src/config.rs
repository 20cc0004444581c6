//! Configuration for a relay run.

use br_error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::filter::{MATCH_ALL_PATTERN, TimeWindow, compile_pattern};
use crate::store::SessionConfig;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default number of concurrent transfers.
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Immutable snapshot of the parameters of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Bucket to list and transfer from
    pub source_container: String,

    /// Bucket to copy into; copying is disabled when unset
    pub destination_container: Option<String>,

    /// Credential profile for the source bucket
    pub source_profile: Option<String>,

    /// Credential profile for the destination bucket
    pub destination_profile: Option<String>,

    /// Regular expression searched for in each key
    pub key_pattern: String,

    /// Inclusive modification-time window
    pub window: TimeWindow,

    /// Prepended to keys in the destination bucket
    pub prefix: String,

    /// Local folder to download into; downloading is disabled when unset
    pub destination_folder: Option<PathBuf>,

    /// List and print only
    pub dry_run: bool,

    /// AWS region for all sessions
    pub region: String,

    /// Custom endpoint URL (for LocalStack)
    pub endpoint: Option<String>,

    /// Maximum transfers in flight
    pub max_concurrency: usize,
}

impl RunConfig {
    /// Create a configuration with defaults for everything but the source
    /// bucket and time window.
    pub fn new(source_container: impl Into<String>, window: TimeWindow) -> Self {
        Self {
            source_container: source_container.into(),
            destination_container: None,
            source_profile: None,
            destination_profile: None,
            key_pattern: MATCH_ALL_PATTERN.to_string(),
            window,
            prefix: String::new(),
            destination_folder: None,
            dry_run: false,
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Set the destination bucket.
    pub fn with_destination_container(mut self, container: impl Into<String>) -> Self {
        self.destination_container = Some(container.into());
        self
    }

    /// Set the source credential profile.
    pub fn with_source_profile(mut self, profile: impl Into<String>) -> Self {
        self.source_profile = Some(profile.into());
        self
    }

    /// Set the destination credential profile.
    pub fn with_destination_profile(mut self, profile: impl Into<String>) -> Self {
        self.destination_profile = Some(profile.into());
        self
    }

    /// Set the key pattern.
    pub fn with_key_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.key_pattern = pattern.into();
        self
    }

    /// Set the destination key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the local download folder.
    pub fn with_destination_folder(mut self, folder: impl AsRef<Path>) -> Self {
        self.destination_folder = Some(folder.as_ref().to_path_buf());
        self
    }

    /// Enable or disable dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set a custom endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the maximum number of concurrent transfers.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Check the configuration before any I/O happens.
    pub fn validate(&self) -> Result<()> {
        if self.source_container.is_empty() {
            return Err(RelayError::Config("source bucket must not be empty".to_string()));
        }
        if self.destination_container.as_deref() == Some("") {
            return Err(RelayError::Config(
                "destination bucket must not be empty".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(RelayError::Config(
                "max concurrency must be at least 1".to_string(),
            ));
        }
        compile_pattern(&self.key_pattern)?;
        Ok(())
    }

    /// Session parameters for the source bucket.
    pub fn source_session(&self) -> SessionConfig {
        SessionConfig::new(&self.region)
            .with_profile(self.source_profile.clone())
            .with_endpoint(self.endpoint.clone())
    }

    /// Session parameters for the destination bucket.
    pub fn destination_session(&self) -> SessionConfig {
        SessionConfig::new(&self.region)
            .with_profile(self.destination_profile.clone())
            .with_endpoint(self.endpoint.clone())
    }

    /// Whether copy tasks will be built.
    pub fn copies(&self) -> bool {
        self.destination_container.is_some()
    }

    /// Whether download tasks will be built.
    pub fn downloads(&self) -> bool {
        self.destination_folder.is_some()
    }
}
