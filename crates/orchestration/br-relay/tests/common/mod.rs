//! In-memory fakes shared by the br-relay tests.

#![allow(dead_code)]

use async_trait::async_trait;
use br_error::{RelayError, Result, TransferError};
use br_relay::{
    AuditSink, ListPage, ObjectRecord, ObjectStore, Output, RawObject, RawTimestamp,
    SessionConfig, SessionFactory,
};
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A copy request seen by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyCall {
    pub source_container: String,
    pub source_key: String,
    pub dest_container: String,
    pub dest_key: String,
    pub size: u64,
}

/// Single-container object store held in memory.
#[derive(Default)]
pub struct MemoryStore {
    objects: Vec<RawObject>,
    page_size: usize,
    fail_listing: bool,
    fail_keys: HashSet<String>,
    panic_keys: HashSet<String>,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    copies: Mutex<Vec<CopyCall>>,
    downloads: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new(objects: Vec<RawObject>) -> Self {
        Self {
            objects,
            page_size: 2,
            ..Default::default()
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_listing_failure(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Make transfers of `key` fail.
    pub fn with_failing_key(mut self, key: &str) -> Self {
        self.fail_keys.insert(key.to_string());
        self
    }

    /// Make transfers of `key` panic.
    pub fn with_panicking_key(mut self, key: &str) -> Self {
        self.panic_keys.insert(key.to_string());
        self
    }

    /// Hold every transfer open for `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn copies(&self) -> Vec<CopyCall> {
        self.copies.lock().clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().clone()
    }

    /// Highest number of transfers observed inside the store at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn transfer(&self, key: &str) -> std::result::Result<(), String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panic_keys.contains(key) {
            panic!("injected panic for {key}");
        }
        if self.fail_keys.contains(key) {
            return Err(format!("injected failure for {key}"));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_page(&self, container: &str, continuation: Option<String>) -> Result<ListPage> {
        if self.fail_listing {
            return Err(RelayError::listing_failed(container, "AccessDenied"));
        }

        let start = match continuation {
            Some(token) => token
                .parse::<usize>()
                .map_err(|e| RelayError::listing_failed(container, e))?,
            None => 0,
        };
        let end = (start + self.page_size).min(self.objects.len());

        Ok(ListPage {
            objects: self.objects[start..end].to_vec(),
            next_continuation: (end < self.objects.len()).then(|| end.to_string()),
        })
    }

    async fn copy(
        &self,
        source_container: &str,
        source_key: &str,
        dest_container: &str,
        dest_key: &str,
        size: u64,
    ) -> Result<()> {
        self.transfer(source_key)
            .await
            .map_err(TransferError::Copy)?;
        self.copies.lock().push(CopyCall {
            source_container: source_container.to_string(),
            source_key: source_key.to_string(),
            dest_container: dest_container.to_string(),
            dest_key: dest_key.to_string(),
            size,
        });
        Ok(())
    }

    async fn download(&self, _container: &str, key: &str, local_path: &Path) -> Result<u64> {
        self.transfer(key).await.map_err(TransferError::Download)?;
        tokio::fs::write(local_path, key.as_bytes())
            .await
            .map_err(TransferError::from)?;
        self.downloads.lock().push(key.to_string());
        Ok(key.len() as u64)
    }
}

/// Hands out the same [`MemoryStore`] for every session and records each open.
pub struct MemorySessions {
    store: Arc<MemoryStore>,
    opened: Mutex<Vec<SessionConfig>>,
}

impl MemorySessions {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn opened(&self) -> Vec<SessionConfig> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl SessionFactory for MemorySessions {
    async fn open(&self, config: &SessionConfig) -> Result<Arc<dyn ObjectStore>> {
        self.opened.lock().push(config.clone());
        Ok(self.store.clone() as Arc<dyn ObjectStore>)
    }
}

/// Audit sink that keeps lines in memory.
#[derive(Default)]
pub struct MemoryAudit {
    lines: Mutex<Vec<String>>,
}

impl MemoryAudit {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl AuditSink for MemoryAudit {
    fn append(&self, line: &str) -> io::Result<()> {
        self.lines.lock().push(line.to_string());
        Ok(())
    }
}

/// Dry-run output that stores records for verification.
#[derive(Default, Clone)]
pub struct CollectingOutput {
    records: Arc<Mutex<Vec<ObjectRecord>>>,
    flushed: Arc<AtomicUsize>,
}

impl CollectingOutput {
    pub fn records(&self) -> Vec<ObjectRecord> {
        self.records.lock().clone()
    }

    pub fn flush_count(&self) -> usize {
        self.flushed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Output for CollectingOutput {
    async fn output(&self, record: &ObjectRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.flushed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Raw listing entry with a UTC timestamp.
pub fn object(key: &str, year: i32, month: u32, day: u32) -> RawObject {
    RawObject {
        key: key.to_string(),
        last_modified: Some(RawTimestamp::from(
            Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap(),
        )),
        size: 100,
        storage_class: "STANDARD".to_string(),
    }
}
