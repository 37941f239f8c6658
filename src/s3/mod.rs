//! Object store module
//!
//! Defines the [`ObjectStore`] seam the upload workflow talks to and the
//! AWS SDK backed [`S3Client`] that implements it against any S3-compatible
//! endpoint.
//!
//! # Tracing
//!
//! Every store operation on [`S3Client`] runs inside a span:
//!
//! | Operation | Span Name | Attributes |
//! |-----------|-----------|------------|
//! | ListBuckets | `s3.list_buckets` | bucket_count |
//! | CreateBucket | `s3.create_bucket` | bucket |
//! | PutObject | `s3.put_object` | bucket, key, bytes, etag |

use crate::upload::{LocalSource, UploadContext};
use async_trait::async_trait;
use thiserror::Error;

mod client;
pub mod credentials;

pub use client::{S3Client, S3ClientError};
pub use credentials::{CredentialsError, CredentialsProvider};

/// Errors reported by an [`ObjectStore`]
///
/// `Canceled` is the one class the workflow treats specially: it means the
/// upload context fired before the store finished.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("operation canceled")]
    Canceled,

    #[error("bucket {0} already exists and is owned by you")]
    BucketAlreadyOwned(String),

    #[error("{operation} failed: {code}: {message}")]
    Service {
        operation: &'static str,
        code: String,
        message: String,
    },

    #[error("{operation} failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("failed to read upload body: {0}")]
    Body(String),
}

impl StoreError {
    /// Whether this error belongs to the cancellation class
    pub fn is_canceled(&self) -> bool {
        matches!(self, StoreError::Canceled)
    }
}

/// Result of a successful PutObject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutReceipt {
    pub etag: Option<String>,
    pub bytes: u64,
}

/// The capabilities the upload workflow needs from an object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Names of all buckets visible to the caller, in the order the store returns them
    async fn list_buckets(&self) -> Result<Vec<String>, StoreError>;

    /// Create a bucket
    ///
    /// Returns [`StoreError::BucketAlreadyOwned`] when the bucket already exists
    /// under the caller's account.
    async fn create_bucket(&self, bucket: &str) -> Result<(), StoreError>;

    /// Upload the full contents of `source` as `bucket/key`
    ///
    /// The store takes ownership of the source so the file handle is released
    /// as soon as the call finishes or is abandoned. Implementations may
    /// return [`StoreError::Canceled`] once `ctx` has fired; callers still
    /// race the returned future against the context.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        source: LocalSource,
        ctx: &UploadContext,
    ) -> Result<PutReceipt, StoreError>;
}
