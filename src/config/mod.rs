//! Configuration module for s3-put
//!
//! Handles loading and parsing of the optional YAML configuration file with
//! support for environment variable expansion and validation. Every field has
//! a default, so running without a file is the common case.

use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

mod duration;
mod loader;

pub use duration::parse_duration;
pub use loader::ConfigLoader;

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// Variable names must start with a letter or underscore and contain only
/// uppercase letters, digits, and underscores.
pub(crate) fn expand_env_vars(s: &str) -> String {
    let re = env_var_pattern();
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name.as_str()) {
            Ok(val) => val,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                // No env var and no default. Keep the original placeholder.
                None => full_match.as_str().to_string(),
            },
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);

    result
}

fn env_var_pattern() -> &'static regex_lite::Regex {
    static PATTERN: std::sync::OnceLock<regex_lite::Regex> = std::sync::OnceLock::new();
    PATTERN.get_or_init(|| {
        regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]+))?\}")
            .unwrap_or_else(|e| panic!("env var pattern is a valid regex: {e}"))
    })
}

// ============================================================================
// Validation Helpers
// ============================================================================

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid duration '{0}': expected a value like 300ms, 1.5s or 2m30s")]
    InvalidDuration(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub s3: S3Config,
    #[serde(default)]
    pub upload: UploadConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.s3.region.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "s3.region cannot be empty".into(),
            ));
        }

        if let Some(ref endpoint) = self.s3.endpoint {
            if !is_valid_http_url(endpoint) {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid s3.endpoint '{}': must start with http:// or https://",
                    endpoint
                )));
            }
        }

        match (&self.s3.access_key, &self.s3.secret_key) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(ConfigError::ValidationError(
                    "s3.access_key and s3.secret_key must be set together".into(),
                ))
            }
            _ => {}
        }

        if self.s3.session_token.is_some() && self.s3.access_key.is_none() {
            return Err(ConfigError::ValidationError(
                "s3.session_token requires s3.access_key and s3.secret_key".into(),
            ));
        }

        if self.upload.file.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "upload.file cannot be empty".into(),
            ));
        }

        Ok(())
    }
}

/// Object store connection settings
///
/// The defaults target a local S3 emulator (LocalStack) over plain HTTP with
/// path-style addressing.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: Option<String>,
    #[serde(default = "default_force_path_style")]
    pub force_path_style: bool,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint: default_endpoint(),
            force_path_style: default_force_path_style(),
            access_key: None,
            secret_key: None,
            session_token: None,
        }
    }
}

fn default_region() -> String {
    "ap-southeast-1".to_string()
}

fn default_endpoint() -> Option<String> {
    Some("http://localhost:4566".to_string())
}

fn default_force_path_style() -> bool {
    true
}

/// Upload settings
///
/// # Example
///
/// ```yaml
/// upload:
///   file: "./sample.txt"
///   timeout: "30s"   # 0 disables the deadline
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_upload_file")]
    pub file: PathBuf,
    #[serde(default, deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            file: default_upload_file(),
            timeout: Duration::ZERO,
        }
    }
}

fn default_upload_file() -> PathBuf {
    PathBuf::from("./sample.txt")
}

/// YAML reads a bare `0` as an integer, everything else with a unit as a string
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDuration {
    Text(String),
    Integer(u64),
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match RawDuration::deserialize(deserializer)? {
        RawDuration::Text(s) => s,
        RawDuration::Integer(n) => n.to_string(),
    };
    parse_duration(&text).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config_targets_local_emulator() {
        let config = Config::default();
        assert_eq!(config.s3.region, "ap-southeast-1");
        assert_eq!(config.s3.endpoint.as_deref(), Some("http://localhost:4566"));
        assert!(config.s3.force_path_style);
        assert_eq!(config.upload.file, PathBuf::from("./sample.txt"));
        assert_eq!(config.upload.timeout, Duration::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_half_credentials() {
        let mut config = Config::default();
        config.s3.access_key = Some("access".into());
        assert!(config.validate().is_err());

        config.s3.secret_key = Some("secret".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_bad_endpoint() {
        let mut config = Config::default();
        config.s3.endpoint = Some("localhost:4566".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_config_validation_rejects_orphan_session_token() {
        let mut config = Config::default();
        config.s3.session_token = Some("token".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str("upload:\n  timeout: 1m30s\n").unwrap();
        assert_eq!(config.upload.timeout, Duration::from_secs(90));
        assert_eq!(config.s3.region, "ap-southeast-1");
        assert_eq!(config.upload.file, PathBuf::from("./sample.txt"));
    }

    #[test]
    fn test_bare_zero_timeout() {
        let config: Config = serde_yaml::from_str("upload:\n  timeout: 0\n").unwrap();
        assert_eq!(config.upload.timeout, Duration::ZERO);

        let result: Result<Config, _> = serde_yaml::from_str("upload:\n  timeout: 10\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_null_endpoint_uses_sdk_default() {
        let config: Config = serde_yaml::from_str("s3:\n  endpoint: ~\n").unwrap();
        assert!(config.s3.endpoint.is_none());
    }

    #[test]
    fn test_negative_timeout_disables_deadline() {
        let config: Config = serde_yaml::from_str("upload:\n  timeout: -5s\n").unwrap();
        assert_eq!(config.upload.timeout, Duration::ZERO);
    }

    #[test]
    fn test_invalid_timeout_is_parse_error() {
        let result: Result<Config, _> = serde_yaml::from_str("upload:\n  timeout: soon\n");
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_expand_env_vars_with_default() {
        std::env::remove_var("S3_PUT_MISSING_VAR");
        assert_eq!(
            expand_env_vars("${S3_PUT_MISSING_VAR:-fallback}"),
            "fallback"
        );
        assert_eq!(
            expand_env_vars("keep ${S3_PUT_MISSING_VAR}"),
            "keep ${S3_PUT_MISSING_VAR}"
        );
    }

    #[test]
    #[serial]
    fn test_expand_env_vars_prefers_environment() {
        std::env::set_var("S3_PUT_REGION_VAR", "eu-west-1");
        assert_eq!(
            expand_env_vars("region: ${S3_PUT_REGION_VAR:-us-east-1}"),
            "region: eu-west-1"
        );
        std::env::remove_var("S3_PUT_REGION_VAR");
    }
}
