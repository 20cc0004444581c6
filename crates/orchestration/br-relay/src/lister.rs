//! Paginated listing with filtering.

use async_stream::try_stream;
use br_error::Result;
use futures::{Stream, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::ObjectRecord;
use crate::filter::KeyFilter;
use crate::store::ObjectStore;

/// Enumerates a container and yields the objects that pass a [`KeyFilter`].
pub struct Lister {
    store: Arc<dyn ObjectStore>,
    container: String,
    filter: KeyFilter,
}

impl Lister {
    /// Create a lister over `container`.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        container: impl Into<String>,
        filter: KeyFilter,
    ) -> Self {
        Self {
            store,
            container: container.into(),
            filter,
        }
    }

    /// List matching objects as a stream.
    ///
    /// Pages are fetched one at a time and records are yielded in provider
    /// order. A failed page fetch ends the stream with that error; the
    /// listing is not resumed. Entries without a timestamp are dropped.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use futures::{StreamExt, pin_mut};
    ///
    /// let stream = lister.list();
    /// pin_mut!(stream);
    ///
    /// while let Some(result) = stream.next().await {
    ///     let record = result?;
    ///     println!("{}\t{}", record.last_modified, record.key);
    /// }
    /// ```
    pub fn list(&self) -> impl Stream<Item = Result<ObjectRecord>> + '_ {
        try_stream! {
            let mut continuation: Option<String> = None;
            let mut pages = 0usize;

            loop {
                let page = self.store.list_page(&self.container, continuation.take()).await?;
                pages += 1;

                for obj in page.objects {
                    let Some(last_modified) = obj.last_modified.map(|t| t.to_utc()) else {
                        trace!(key = %obj.key, "Skipping object without timestamp");
                        continue;
                    };

                    if !self.filter.matches(&obj.key, last_modified) {
                        trace!(key = %obj.key, "Filtered out");
                        continue;
                    }

                    yield ObjectRecord {
                        key: obj.key,
                        last_modified,
                        size: obj.size,
                        storage_class: obj.storage_class,
                    };
                }

                match page.next_continuation {
                    Some(token) => continuation = Some(token),
                    None => break,
                }
            }

            debug!(bucket = %self.container, pages, "Listing completed");
        }
    }

    /// Collect the full filtered listing.
    pub async fn collect(&self) -> Result<Vec<ObjectRecord>> {
        debug!(
            bucket = %self.container,
            filter = %self.filter.description(),
            "Starting listing"
        );
        self.list().try_collect().await
    }

    /// Get the container being listed.
    pub fn container(&self) -> &str {
        &self.container
    }
}
