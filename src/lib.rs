//! s3-put Library
//!
//! Uploads one local file to an S3-compatible bucket, creating the bucket
//! when it is missing, with an optional deadline on the upload itself.
//!
//! # Example
//!
//! ```no_run
//! use s3_put::{config::Config, s3::S3Client, upload::{UploadRequest, UploadWorkflow}};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("s3-put.yaml")?;
//!     let client = S3Client::new(&config.s3).await?;
//!     let request = UploadRequest::new("my-bucket", "file.txt", "./sample.txt", Duration::from_secs(30))?;
//!     let outcome = UploadWorkflow::new(client).run(&request).await;
//!     std::process::exit(i32::from(outcome.exit_code()));
//! }
//! ```

pub mod config;
pub mod s3;
pub mod telemetry;
pub mod upload;

// Re-export commonly used types
pub use config::Config;
pub use upload::{UploadOutcome, UploadRequest, UploadWorkflow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
