//! s3-put - upload one file to an S3 bucket under an optional deadline

use anyhow::Context;
use clap::Parser;
use s3_put::config::{parse_duration, Config};
use s3_put::s3::S3Client;
use s3_put::telemetry::init_subscriber;
use s3_put::upload::{UploadOutcome, UploadRequest, UploadWorkflow};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

/// Upload a local file to an S3 bucket, creating the bucket if it does not exist
#[derive(Parser, Debug)]
#[command(name = "s3-put")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bucket name
    #[arg(short = 'b', default_value = "")]
    bucket: String,

    /// Object key
    #[arg(short = 'k', default_value = "")]
    key: String,

    /// Upload timeout such as 500ms, 30s or 1m30s; 0 or negative disables the deadline
    #[arg(short = 'd', value_parser = parse_timeout, allow_hyphen_values = true)]
    timeout: Option<Duration>,

    /// Local file to upload [default: ./sample.txt]
    #[arg(short = 'f')]
    file: Option<PathBuf>,

    /// Path to an optional configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Object store endpoint, overriding the configuration
    #[arg(long)]
    endpoint: Option<String>,

    /// Region, overriding the configuration
    #[arg(long)]
    region: Option<String>,

    /// Log level used when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    parse_duration(s).map_err(|e| e.to_string())
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(endpoint) = &args.endpoint {
        config.s3.endpoint = Some(endpoint.clone());
    }
    if let Some(region) = &args.region {
        config.s3.region = region.clone();
    }
    if let Some(file) = &args.file {
        config.upload.file = file.clone();
    }
    if let Some(timeout) = args.timeout {
        config.upload.timeout = timeout;
    }

    config.validate()?;
    Ok(config)
}

async fn run(args: Args) -> anyhow::Result<UploadOutcome> {
    let config = load_config(&args)?;
    let request = UploadRequest::new(
        args.bucket,
        args.key,
        config.upload.file.clone(),
        config.upload.timeout,
    )?;
    info!(
        "start upload file to {}/{}",
        request.bucket(),
        request.key()
    );

    let client = S3Client::new(&config.s3).await?;
    let workflow = UploadWorkflow::new(client);

    Ok(workflow.run(&request).await)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_subscriber(&args.log_level, args.json) {
        eprintln!("s3-put: {e}");
        return ExitCode::FAILURE;
    }

    info!("Starting s3-put v{}", s3_put::VERSION);

    match run(args).await {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            error!(error = %format!("{e:#}"), "s3-put failed");
            ExitCode::FAILURE
        }
    }
}
