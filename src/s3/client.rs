//! AWS SDK backed object store client

use super::{CredentialsError, CredentialsProvider, ObjectStore, PutReceipt, StoreError};
use crate::config::S3Config;
use crate::upload::{LocalSource, UploadContext};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::StalledStreamProtectionConfig;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_smithy_runtime_api::client::result::SdkError;
use thiserror::Error;

/// Region where CreateBucket must not carry a location constraint
const DEFAULT_S3_REGION: &str = "us-east-1";

/// S3 client construction errors
#[derive(Error, Debug)]
pub enum S3ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Credentials error: {0}")]
    CredentialsError(#[from] CredentialsError),
}

/// S3 client
///
/// Wraps an `aws_sdk_s3::Client` configured from [`S3Config`]: region,
/// optional custom endpoint, path-style addressing and optional static
/// credentials.
#[derive(Debug, Clone)]
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    region: String,
    endpoint: Option<String>,
}

impl S3Client {
    /// Create a new S3 client
    pub async fn new(config: &S3Config) -> Result<Self, S3ClientError> {
        if config.region.trim().is_empty() {
            return Err(S3ClientError::ConfigError("region cannot be empty".into()));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if let Some(credentials) = CredentialsProvider::from_config(config)? {
            loader = loader.credentials_provider(credentials);
        }
        let sdk_config = loader.load().await;
        tracing::info!(region = %config.region, "session created");

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .stalled_stream_protection(StalledStreamProtectionConfig::disabled());
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        let inner = aws_sdk_s3::Client::from_conf(builder.build());
        tracing::info!(
            endpoint = config.endpoint.as_deref().unwrap_or("default"),
            path_style = config.force_path_style,
            "s3 client created"
        );

        Ok(Self {
            inner,
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        })
    }

    /// Get the region
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Get the endpoint URL
    pub fn endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("https://s3.{}.amazonaws.com", self.region))
    }

    fn bucket_configuration(&self) -> Option<CreateBucketConfiguration> {
        if self.region == DEFAULT_S3_REGION {
            return None;
        }
        Some(
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                .build(),
        )
    }
}

/// Map an SDK failure onto the store error taxonomy
fn classify<E, R>(operation: &'static str, err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    match err.as_service_error() {
        Some(service) => StoreError::Service {
            operation,
            code: service.code().unwrap_or("Unknown").to_string(),
            message: service.message().unwrap_or_default().to_string(),
        },
        None => StoreError::Transport {
            operation,
            message: DisplayErrorContext(&err).to_string(),
        },
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    #[tracing::instrument(
        name = "s3.list_buckets",
        skip(self),
        fields(bucket_count = tracing::field::Empty),
        err
    )]
    async fn list_buckets(&self) -> Result<Vec<String>, StoreError> {
        let output = self
            .inner
            .list_buckets()
            .send()
            .await
            .map_err(|e| classify("ListBuckets", e))?;

        let names: Vec<String> = output
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_string))
            .collect();
        tracing::Span::current().record("bucket_count", names.len());

        Ok(names)
    }

    #[tracing::instrument(name = "s3.create_bucket", skip(self), fields(s3.bucket = %bucket), err)]
    async fn create_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        let request = self
            .inner
            .create_bucket()
            .bucket(bucket)
            .set_create_bucket_configuration(self.bucket_configuration());

        match request.send().await {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_bucket_already_owned_by_you()) =>
            {
                Err(StoreError::BucketAlreadyOwned(bucket.to_string()))
            }
            Err(err) => Err(classify("CreateBucket", err)),
        }
    }

    #[tracing::instrument(
        name = "s3.put_object",
        skip(self, source, ctx),
        fields(
            s3.bucket = %bucket,
            s3.key = %key,
            upload.bytes = source.len(),
            s3.etag = tracing::field::Empty
        ),
        err
    )]
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        source: LocalSource,
        ctx: &UploadContext,
    ) -> Result<PutReceipt, StoreError> {
        if ctx.is_expired() {
            return Err(StoreError::Canceled);
        }

        let bytes = source.len();
        let body = ByteStream::read_from()
            .file(source.into_file())
            .build()
            .await
            .map_err(|e| StoreError::Body(e.to_string()))?;

        let output = self
            .inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| classify("PutObject", e))?;

        let etag = output.e_tag().map(str::to_string);
        if let Some(ref etag) = etag {
            tracing::Span::current().record("s3.etag", etag.as_str());
        }

        Ok(PutReceipt { etag, bytes })
    }
}
