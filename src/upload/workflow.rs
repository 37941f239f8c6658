//! The list → create → open → put sequence
//!
//! ```text
//! Init → BucketsListed → BucketEnsured → FileOpened → Uploading → {Success | TimedOut | Failed}
//! ```
//!
//! Nothing is retried. Any failing step ends the run with `Failed`.

use super::{LocalSource, UploadContext, UploadError, UploadOutcome, UploadReceipt, UploadRequest};
use crate::s3::{ObjectStore, StoreError};
use std::path::Path;
use std::time::Instant;

/// How the target bucket came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    /// Listed by the store before we touched it
    Existing,
    /// Created by this run
    Created,
    /// Not listed, but creation reported it as already owned by the caller
    AlreadyOwned,
}

/// Runs one upload against an [`ObjectStore`]
#[derive(Debug)]
pub struct UploadWorkflow<S> {
    store: S,
}

impl<S: ObjectStore> UploadWorkflow<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[cfg(test)]
    fn store(&self) -> &S {
        &self.store
    }

    /// Make sure `bucket` exists, creating it when the listing does not contain it
    ///
    /// Membership is an exact, case-sensitive comparison against each listed name.
    pub async fn ensure_bucket(&self, bucket: &str) -> Result<BucketStatus, UploadError> {
        let buckets = self
            .store
            .list_buckets()
            .await
            .map_err(UploadError::ListBuckets)?;
        tracing::info!(?buckets, "buckets listed");

        if buckets.iter().any(|name| name == bucket) {
            return Ok(BucketStatus::Existing);
        }

        match self.store.create_bucket(bucket).await {
            Ok(()) => {
                tracing::info!(bucket = %bucket, "bucket created");
                Ok(BucketStatus::Created)
            }
            Err(StoreError::BucketAlreadyOwned(_)) => {
                tracing::warn!(
                    bucket = %bucket,
                    "bucket missing from listing but already owned, continuing"
                );
                Ok(BucketStatus::AlreadyOwned)
            }
            Err(source) => Err(UploadError::CreateBucket {
                bucket: bucket.to_string(),
                source,
            }),
        }
    }

    /// Open the local file that supplies the object's bytes
    pub async fn open_source(&self, path: &Path) -> Result<LocalSource, UploadError> {
        let source = LocalSource::open(path)
            .await
            .map_err(|source| UploadError::OpenFile {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!(path = %path.display(), bytes = source.len(), "file opened");
        Ok(source)
    }

    /// Put `source` as `bucket/key`, abandoning the call when `ctx` fires
    ///
    /// Abandoning drops the in-flight request together with the file handle.
    pub async fn upload_with_deadline(
        &self,
        bucket: &str,
        key: &str,
        source: LocalSource,
        ctx: &UploadContext,
    ) -> UploadOutcome {
        let started = Instant::now();
        let put = self.store.put_object(bucket, key, source, ctx);

        let result = tokio::select! {
            biased;
            result = put => result,
            _ = ctx.cancelled() => Err(StoreError::Canceled),
        };
        tracing::info!(elapsed_ms = started.elapsed().as_millis(), "put object finished");

        match result {
            Ok(receipt) => UploadOutcome::Success(UploadReceipt {
                bucket: bucket.to_string(),
                key: key.to_string(),
                bytes: receipt.bytes,
                etag: receipt.etag,
            }),
            Err(err) if err.is_canceled() => UploadError::UploadTimeout {
                timeout: ctx.timeout(),
            }
            .into(),
            Err(err) => UploadError::Upload(err).into(),
        }
    }

    /// Run the whole sequence for `request`
    #[tracing::instrument(
        name = "upload.run",
        skip(self, request),
        fields(s3.bucket = %request.bucket(), s3.key = %request.key())
    )]
    pub async fn run(&self, request: &UploadRequest) -> UploadOutcome {
        let ctx = UploadContext::with_timeout(request.timeout());
        tracing::info!(timeout_ms = request.timeout().as_millis(), "ctx created");

        let outcome = match self.prepare(request).await {
            Ok(source) => {
                self.upload_with_deadline(request.bucket(), request.key(), source, &ctx)
                    .await
            }
            Err(err) => err.into(),
        };

        match &outcome {
            UploadOutcome::Success(receipt) => tracing::info!(
                bytes = receipt.bytes,
                etag = receipt.etag.as_deref().unwrap_or(""),
                "successfully uploaded file to {}/{}",
                receipt.bucket,
                receipt.key
            ),
            UploadOutcome::TimedOut { timeout } => tracing::error!(
                timeout_ms = timeout.as_millis(),
                "upload canceled due to timeout"
            ),
            UploadOutcome::Failed(err) => tracing::error!(error = %err, "upload failed"),
        }

        outcome
    }

    async fn prepare(&self, request: &UploadRequest) -> Result<LocalSource, UploadError> {
        self.ensure_bucket(request.bucket()).await?;
        self.open_source(request.source()).await
    }
}
