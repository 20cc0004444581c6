//! End-to-end relay runs against LocalStack S3.

use crate::common::{LocalStackTestContext, MemoryAudit};
use async_trait::async_trait;
use br_error::Result;
use br_relay::{
    BatchOrchestrator, ObjectRecord, ObjectStore, Output, OutcomeReporter, RunConfig, RunReport,
    S3SessionFactory, SessionConfig, SessionFactory, TimeWindow,
};
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// Collecting output that stores dry-run records for verification.
#[derive(Default, Clone)]
struct CollectingOutput {
    records: Arc<Mutex<Vec<ObjectRecord>>>,
}

impl CollectingOutput {
    fn keys(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.key.clone()).collect()
    }
}

#[async_trait]
impl Output for CollectingOutput {
    async fn output(&self, record: &ObjectRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

fn recent_window() -> TimeWindow {
    let now = Utc::now();
    TimeWindow::new(now - Duration::hours(1), now + Duration::hours(1))
}

fn config(ctx: &LocalStackTestContext, bucket: &str) -> RunConfig {
    RunConfig::new(bucket, recent_window())
        .with_region(&ctx.region)
        .with_endpoint(&ctx.endpoint)
}

fn orchestrator(
    config: RunConfig,
    audit: Arc<MemoryAudit>,
    output: CollectingOutput,
) -> BatchOrchestrator<CollectingOutput> {
    BatchOrchestrator::new(
        config,
        Arc::new(S3SessionFactory),
        OutcomeReporter::new(audit),
        output,
    )
    .unwrap()
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_copy_matching_objects() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let source = "relay-copy-src";
    let destination = "relay-copy-dst";
    ctx.create_bucket(source).await.unwrap();
    ctx.create_bucket(destination).await.unwrap();
    ctx.empty_bucket(destination).await;

    ctx.put_object(source, "logs/a.txt", "alpha").await.unwrap();
    ctx.put_object(source, "logs/b.bin", "beta").await.unwrap();
    ctx.put_object(source, "logs/with space+plus.txt", "gamma")
        .await
        .unwrap();

    let audit = Arc::new(MemoryAudit::default());
    let config = config(&ctx, source)
        .with_key_pattern(r"\.txt$")
        .with_destination_container(destination)
        .with_prefix("backup/")
        .with_max_concurrency(2);

    let report = orchestrator(config, audit.clone(), CollectingOutput::default())
        .run()
        .await
        .unwrap();

    let RunReport::Completed(stats) = report else {
        panic!("expected completed run");
    };
    assert_eq!(stats.transfers_succeeded, 2);
    assert_eq!(stats.transfers_failed, 0);

    let mut keys = ctx.list_keys(destination, Some("backup/")).await.unwrap();
    keys.sort();
    assert_eq!(
        keys,
        vec!["backup/logs/a.txt", "backup/logs/with space+plus.txt"]
    );
    assert_eq!(
        ctx.get_object_text(destination, "backup/logs/a.txt")
            .await
            .unwrap(),
        "alpha"
    );
    assert_eq!(audit.lines().len(), 2);

    ctx.empty_bucket(source).await;
    ctx.empty_bucket(destination).await;
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_download_matching_objects() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let source = "relay-download-src";
    ctx.create_bucket(source).await.unwrap();
    ctx.put_object(source, "reports/q1.csv", "id,total\n1,10\n")
        .await
        .unwrap();
    ctx.put_object(source, "reports/q1.json", "{}").await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let folder = dir.path().join("downloads");
    let audit = Arc::new(MemoryAudit::default());
    let config = config(&ctx, source)
        .with_key_pattern(r"\.csv$")
        .with_destination_folder(&folder);

    let report = orchestrator(config, audit.clone(), CollectingOutput::default())
        .run()
        .await
        .unwrap();

    assert!(matches!(report, RunReport::Completed(_)));
    let body = std::fs::read_to_string(folder.join("reports_q1.csv")).unwrap();
    assert_eq!(body, "id,total\n1,10\n");
    assert!(!folder.join("reports_q1.json").exists());

    let lines = audit.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("Downloaded: s3://relay-download-src/reports/q1.csv to "));

    ctx.empty_bucket(source).await;
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_dry_run_lists_only() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let source = "relay-dry-run-src";
    let destination = "relay-dry-run-dst";
    ctx.create_bucket(source).await.unwrap();
    ctx.create_bucket(destination).await.unwrap();
    ctx.empty_bucket(destination).await;
    ctx.put_object(source, "a.txt", "a").await.unwrap();
    ctx.put_object(source, "b.txt", "b").await.unwrap();

    let audit = Arc::new(MemoryAudit::default());
    let output = CollectingOutput::default();
    let config = config(&ctx, source)
        .with_destination_container(destination)
        .with_dry_run(true);

    let report = orchestrator(config, audit.clone(), output.clone())
        .run()
        .await
        .unwrap();

    assert!(matches!(report, RunReport::DryRun { records: 2 }));
    assert_eq!(output.keys(), vec!["a.txt", "b.txt"]);
    assert!(ctx.list_keys(destination, None).await.unwrap().is_empty());
    assert!(audit.lines().is_empty());

    ctx.empty_bucket(source).await;
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_missing_bucket_fails_listing() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let config = config(&ctx, "relay-no-such-bucket").with_destination_container("anywhere");

    let result = orchestrator(
        config,
        Arc::new(MemoryAudit::default()),
        CollectingOutput::default(),
    )
    .run()
    .await;

    assert!(matches!(
        result,
        Err(br_error::RelayError::ListingFailed { .. })
    ));
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_store_pagination() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let bucket = "relay-page-src";
    ctx.create_bucket(bucket).await.unwrap();
    for i in 0..5 {
        ctx.put_object(bucket, &format!("obj-{i}"), "x").await.unwrap();
    }

    let session = SessionConfig::new(&ctx.region).with_endpoint(Some(ctx.endpoint.clone()));
    let store: Arc<dyn ObjectStore> = S3SessionFactory.open(&session).await.unwrap();

    let page = store.list_page(bucket, None).await.unwrap();
    assert_eq!(page.objects.len(), 5);
    assert!(page.next_continuation.is_none());
    assert!(page.objects.iter().all(|o| o.last_modified.is_some()));

    ctx.empty_bucket(bucket).await;
}
