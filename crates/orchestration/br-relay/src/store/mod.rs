//! Object store capability used by the relay.
//!
//! This module provides:
//! - [`ObjectStore`] - paginated listing, remote copy and download
//! - [`SessionFactory`] - opens a store scoped to a profile and region
//! - [`S3Store`] / [`S3SessionFactory`] - the AWS S3 implementation

mod s3;

pub use s3::{S3SessionFactory, S3Store, create_s3_client};

use async_trait::async_trait;
use br_error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::filter::RawTimestamp;

/// An object entry as returned by a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObject {
    pub key: String,
    pub last_modified: Option<RawTimestamp>,
    pub size: u64,
    pub storage_class: String,
}

/// One page of a listing.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Entries on this page, in provider order
    pub objects: Vec<RawObject>,

    /// Cursor for the next page; `None` on the last page
    pub next_continuation: Option<String>,
}

/// Storage operations needed by the relay.
///
/// Implementations must be shareable across concurrently running transfer
/// tasks and must not require mutable access.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one page of the container listing.
    async fn list_page(&self, container: &str, continuation: Option<String>) -> Result<ListPage>;

    /// Copy `source_key` from `source_container` to `dest_key` in `dest_container`.
    ///
    /// `size` is the source object size from the listing; implementations
    /// use it to pick a single-request or chunked copy. An existing object at
    /// the destination is overwritten.
    async fn copy(
        &self,
        source_container: &str,
        source_key: &str,
        dest_container: &str,
        dest_key: &str,
        size: u64,
    ) -> Result<()>;

    /// Download an object to `local_path`, returning the number of bytes written.
    ///
    /// A file already at `local_path` is only replaced once the whole body
    /// has been received.
    async fn download(&self, container: &str, key: &str, local_path: &Path) -> Result<u64>;
}

/// Parameters for opening a store session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Named credential profile
    pub profile: Option<String>,

    /// Region identifier
    pub region: String,

    /// Custom endpoint URL (for LocalStack)
    pub endpoint: Option<String>,
}

impl SessionConfig {
    /// Create a session configuration for a region.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Default::default()
        }
    }

    /// Set the credential profile.
    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }

    /// Set a custom endpoint.
    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.endpoint = endpoint;
        self
    }
}

/// Opens store sessions.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self, config: &SessionConfig) -> Result<Arc<dyn ObjectStore>>;
}

/// Sessions used while dispatching transfers.
///
/// Download tasks share the source store, copy tasks share the destination
/// store. A store is only present when the matching destination is configured.
#[derive(Clone, Default)]
pub struct TransferStores {
    pub source: Option<Arc<dyn ObjectStore>>,
    pub destination: Option<Arc<dyn ObjectStore>>,
}

impl TransferStores {
    /// Create an empty set of stores.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the store used by download tasks.
    pub fn with_source(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.source = Some(store);
        self
    }

    /// Set the store used by copy tasks.
    pub fn with_destination(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.destination = Some(store);
        self
    }
}
