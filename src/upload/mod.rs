//! Upload module
//!
//! Runs the single-file upload: make sure the bucket exists, open the local
//! file, then put it under an optional deadline.

use crate::s3::StoreError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

mod context;
mod source;
mod workflow;

pub use context::UploadContext;
pub use source::LocalSource;
pub use workflow::{BucketStatus, UploadWorkflow};

/// Upload errors
///
/// Every variant is terminal for the run.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("invalid upload request: {0}")]
    InvalidRequest(String),

    #[error("list buckets error: {0}")]
    ListBuckets(#[source] StoreError),

    #[error("create bucket {bucket} error: {source}")]
    CreateBucket {
        bucket: String,
        #[source]
        source: StoreError,
    },

    #[error("open file error, {}: {source}", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("upload canceled due to timeout after {timeout:?}")]
    UploadTimeout { timeout: Duration },

    #[error("failed to upload object: {0}")]
    Upload(#[source] StoreError),
}

/// What to upload and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    bucket: String,
    key: String,
    source: PathBuf,
    timeout: Duration,
}

impl UploadRequest {
    /// Build a request; bucket and key must be non-empty
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
        source: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Result<Self, UploadError> {
        let bucket = bucket.into();
        let key = key.into();

        if bucket.is_empty() {
            return Err(UploadError::InvalidRequest(
                "bucket name cannot be empty".into(),
            ));
        }
        if key.is_empty() {
            return Err(UploadError::InvalidRequest(
                "object key cannot be empty".into(),
            ));
        }

        Ok(Self {
            bucket,
            key,
            source: source.into(),
            timeout,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Upload timeout; zero means no deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Details of a finished upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub bucket: String,
    pub key: String,
    pub bytes: u64,
    pub etag: Option<String>,
}

/// Terminal result of one run
#[derive(Debug)]
pub enum UploadOutcome {
    Success(UploadReceipt),
    TimedOut { timeout: Duration },
    Failed(UploadError),
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success(_))
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, UploadOutcome::TimedOut { .. })
    }

    /// Process exit status: 0 on success, 1 otherwise
    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

impl From<UploadError> for UploadOutcome {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::UploadTimeout { timeout } => UploadOutcome::TimedOut { timeout },
            other => UploadOutcome::Failed(other),
        }
    }
}
