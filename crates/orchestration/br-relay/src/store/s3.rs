//! AWS S3 implementation of the object store.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use br_error::{RelayError, Result, TransferError};
use chrono::DateTime;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, warn};

use super::{ListPage, ObjectStore, RawObject, SessionConfig, SessionFactory};
use crate::filter::RawTimestamp;

/// Create an S3 client from a session configuration.
pub async fn create_s3_client(config: &SessionConfig) -> Client {
    use aws_config::Region;

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()));

    if let Some(endpoint) = &config.endpoint {
        loader = loader.endpoint_url(endpoint);
    }

    if let Some(profile) = &config.profile {
        loader = loader.profile_name(profile);
    }

    let sdk_config = loader.load().await;

    // Path-style addressing for custom endpoints (LocalStack)
    let builder = aws_sdk_s3::config::Builder::from(&sdk_config);
    let s3_config = if config.endpoint.is_some() {
        builder.force_path_style(true).build()
    } else {
        builder.build()
    };

    Client::from_conf(s3_config)
}

/// Largest object copied with a single `CopyObject` request.
const MULTIPART_COPY_THRESHOLD: u64 = 5 * 1024 * 1024 * 1024;

/// Smallest part used by a multipart copy.
const MIN_COPY_PART_SIZE: u64 = 512 * 1024 * 1024;

/// S3 limit on parts per multipart upload.
const MAX_COPY_PARTS: u64 = 10_000;

/// Build the `x-amz-copy-source` value; the key must be URL-encoded.
fn copy_source(container: &str, key: &str) -> String {
    format!("{}/{}", container, urlencoding::encode(key))
}

/// Inclusive byte ranges of each part of a multipart copy.
///
/// Parts are at least [`MIN_COPY_PART_SIZE`] and grow so that no object
/// needs more than [`MAX_COPY_PARTS`] parts.
fn copy_part_ranges(size: u64) -> Vec<(u64, u64)> {
    let part_size = size.div_ceil(MAX_COPY_PARTS).max(MIN_COPY_PART_SIZE);
    let mut ranges = Vec::new();
    let mut start = 0;
    while start < size {
        let end = (start + part_size).min(size) - 1;
        ranges.push((start, end));
        start = end + 1;
    }
    ranges
}

/// Sibling path a download streams into before it is renamed into place.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Stream `body` into `path`.
///
/// The bytes go to `<path>.part` first and are renamed onto `path` only
/// after the whole body was written, so a failed transfer leaves any
/// existing file untouched. The partial file is removed on error.
async fn write_atomically<R>(body: &mut R, path: &Path) -> Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let partial = partial_path(path);

    let result = async {
        let mut file = tokio::fs::File::create(&partial).await?;
        let bytes = tokio::io::copy(body, &mut file)
            .await
            .map_err(|e| TransferError::Download(format!("streaming body failed: {e}")))?;
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&partial, path).await?;
        Ok::<_, TransferError>(bytes)
    }
    .await;

    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(&partial).await {
            debug!(path = %partial.display(), error = %e, "Partial download not removed");
        }
    }

    Ok(result?)
}

/// S3-backed [`ObjectStore`].
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Wrap an existing client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Copy a large object as a multipart upload of ranged part copies.
    ///
    /// The upload is aborted when any part or the completion fails.
    async fn copy_multipart(
        &self,
        source: &str,
        dest_container: &str,
        dest_key: &str,
        size: u64,
    ) -> std::result::Result<(), TransferError> {
        let upload = self
            .client
            .create_multipart_upload()
            .bucket(dest_container)
            .key(dest_key)
            .send()
            .await
            .map_err(|e| TransferError::Copy(DisplayErrorContext(&e).to_string()))?;
        let upload_id = upload
            .upload_id()
            .ok_or_else(|| TransferError::Copy("multipart upload returned no upload id".into()))?
            .to_string();

        let result = self
            .copy_parts(source, dest_container, dest_key, &upload_id, size)
            .await;

        if result.is_err() {
            if let Err(e) = self
                .client
                .abort_multipart_upload()
                .bucket(dest_container)
                .key(dest_key)
                .upload_id(&upload_id)
                .send()
                .await
            {
                warn!(
                    bucket = dest_container,
                    key = dest_key,
                    upload_id = %upload_id,
                    error = %DisplayErrorContext(&e),
                    "Failed to abort multipart copy"
                );
            }
        }

        result
    }

    async fn copy_parts(
        &self,
        source: &str,
        dest_container: &str,
        dest_key: &str,
        upload_id: &str,
        size: u64,
    ) -> std::result::Result<(), TransferError> {
        let ranges = copy_part_ranges(size);
        let mut parts = Vec::with_capacity(ranges.len());

        for (index, (start, end)) in ranges.into_iter().enumerate() {
            let part_number = (index + 1) as i32;
            let resp = self
                .client
                .upload_part_copy()
                .bucket(dest_container)
                .key(dest_key)
                .upload_id(upload_id)
                .part_number(part_number)
                .copy_source(source)
                .copy_source_range(format!("bytes={start}-{end}"))
                .send()
                .await
                .map_err(|e| TransferError::Copy(DisplayErrorContext(&e).to_string()))?;

            let e_tag = resp
                .copy_part_result()
                .and_then(|part| part.e_tag())
                .ok_or_else(|| {
                    TransferError::Copy(format!("part {part_number} returned no ETag"))
                })?;

            parts.push(
                CompletedPart::builder()
                    .part_number(part_number)
                    .e_tag(e_tag)
                    .build(),
            );
        }

        debug!(key = dest_key, parts = parts.len(), "Completing multipart copy");

        self.client
            .complete_multipart_upload()
            .bucket(dest_container)
            .key(dest_key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| TransferError::Copy(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_page(&self, container: &str, continuation: Option<String>) -> Result<ListPage> {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(container)
            .set_continuation_token(continuation)
            .send()
            .await
            .map_err(|e| RelayError::listing_failed(container, DisplayErrorContext(&e)))?;

        let next_continuation = if resp.is_truncated == Some(true) {
            resp.next_continuation_token
        } else {
            None
        };

        let objects = resp
            .contents
            .unwrap_or_default()
            .into_iter()
            .map(|obj| RawObject {
                key: obj.key.unwrap_or_default(),
                last_modified: obj
                    .last_modified
                    .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
                    .map(RawTimestamp::from),
                size: obj.size.unwrap_or(0).max(0) as u64,
                storage_class: obj
                    .storage_class
                    .map(|class| class.as_str().to_string())
                    .unwrap_or_default(),
            })
            .collect::<Vec<_>>();

        debug!(
            bucket = container,
            objects = objects.len(),
            more = next_continuation.is_some(),
            "Listed page"
        );

        Ok(ListPage {
            objects,
            next_continuation,
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
        let source = copy_source(source_container, source_key);

        if size > MULTIPART_COPY_THRESHOLD {
            self.copy_multipart(&source, dest_container, dest_key, size)
                .await?;
            return Ok(());
        }

        self.client
            .copy_object()
            .copy_source(source)
            .bucket(dest_container)
            .key(dest_key)
            .send()
            .await
            .map_err(|e| TransferError::Copy(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }

    async fn download(&self, container: &str, key: &str, local_path: &Path) -> Result<u64> {
        let resp = self
            .client
            .get_object()
            .bucket(container)
            .key(key)
            .send()
            .await
            .map_err(|e| TransferError::Download(DisplayErrorContext(&e).to_string()))?;

        let mut body = resp.body.into_async_read();
        write_atomically(&mut body, local_path).await
    }
}

/// Opens [`S3Store`] sessions through the default AWS credential chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct S3SessionFactory;

#[async_trait]
impl SessionFactory for S3SessionFactory {
    async fn open(&self, config: &SessionConfig) -> Result<Arc<dyn ObjectStore>> {
        debug!(
            region = %config.region,
            profile = ?config.profile,
            endpoint = ?config.endpoint,
            "Opening S3 session"
        );
        let client = create_s3_client(config).await;
        Ok(Arc::new(S3Store::new(client)))
    }
}
