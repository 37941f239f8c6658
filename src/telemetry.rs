//! Tracing subscriber setup
//!
//! ```text
//! Registry
//!   ├── EnvFilter (RUST_LOG, falling back to --log-level)
//!   └── Fmt Layer (stdout, plain or JSON)
//! ```

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Errors that can occur while installing the subscriber
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log level '{0}'")]
    InvalidLevel(String),

    #[error("Failed to install subscriber: {0}")]
    InitError(String),
}

/// Build the filter: `RUST_LOG` wins, otherwise `default_level`
pub fn env_filter(default_level: &str) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_level.to_lowercase())
            .map_err(|_| TelemetryError::InvalidLevel(default_level.to_string())),
    }
}

/// Install the global subscriber
pub fn init_subscriber(default_level: &str, json: bool) -> Result<(), TelemetryError> {
    let filter = env_filter(default_level)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init()
    };

    result.map_err(|e| TelemetryError::InitError(e.to_string()))
}
