//! Error types and classification for bucket-relay.
//!
//! This crate provides:
//! - [`RelayError`] - Top-level error enum for a relay run
//! - [`TransferError`] - Errors from a single copy or download
//! - [`ErrorSeverity`] for deciding whether an error ends the run
//! - [`classify_error`] mapping errors to severities

use thiserror::Error;

/// Top-level error type for bucket-relay.
#[derive(Error, Debug)]
pub enum RelayError {
    /// A start/end time expression could not be parsed
    #[error("Invalid time expression '{input}': {reason}")]
    InvalidTimeExpression { input: String, reason: String },

    /// The key pattern is not a valid regular expression
    #[error("Invalid key pattern: {0}")]
    InvalidPattern(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Enumeration of a container could not complete
    #[error("Listing of '{container}' failed: {reason}")]
    ListingFailed { container: String, reason: String },

    /// A single transfer failed
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// Dispatcher invariant violated (slot accounting, lost outcomes)
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// Generic errors (wrapped anyhow)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RelayError {
    /// Build an [`RelayError::InvalidTimeExpression`].
    pub fn invalid_time(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTimeExpression {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`RelayError::ListingFailed`].
    pub fn listing_failed(container: impl Into<String>, reason: impl ToString) -> Self {
        Self::ListingFailed {
            container: container.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error terminates the run.
    pub fn is_fatal(&self) -> bool {
        classify_error(self) == ErrorSeverity::Fatal
    }
}

/// Errors from a single transfer operation.
#[derive(Error, Debug)]
pub enum TransferError {
    /// Remote copy was rejected or failed in transit
    #[error("Copy failed: {0}")]
    Copy(String),

    /// Fetching the object body failed
    #[error("Download failed: {0}")]
    Download(String),

    /// Writing to the local filesystem failed
    #[error("Local I/O error: {0}")]
    LocalIo(String),
}

impl From<std::io::Error> for TransferError {
    fn from(e: std::io::Error) -> Self {
        Self::LocalIo(e.to_string())
    }
}

/// How an error affects the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The run stops and exits with a failure status
    Fatal,

    /// Recorded as a failed outcome; sibling transfers and the exit status are unaffected
    Recoverable,
}

/// Classifies an error to decide whether the run can continue.
pub fn classify_error(error: &RelayError) -> ErrorSeverity {
    match error {
        RelayError::Transfer(_) => ErrorSeverity::Recoverable,
        RelayError::InvalidTimeExpression { .. }
        | RelayError::InvalidPattern(_)
        | RelayError::Config(_)
        | RelayError::ListingFailed { .. }
        | RelayError::Dispatch(_)
        | RelayError::Other(_) => ErrorSeverity::Fatal,
    }
}

/// Result type alias using RelayError.
pub type Result<T> = std::result::Result<T, RelayError>;
