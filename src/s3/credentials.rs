//! S3 Credentials Module
//!
//! Resolves static credentials from configuration. When none are configured
//! the SDK default chain (environment, profile, instance metadata) is used.
//!
//! # Example
//!
//! ```
//! use s3_put::config::S3Config;
//! use s3_put::s3::CredentialsProvider;
//!
//! let config = S3Config {
//!     access_key: Some("access-key".into()),
//!     secret_key: Some("secret-key".into()),
//!     ..S3Config::default()
//! };
//!
//! let creds = CredentialsProvider::from_config(&config).unwrap().unwrap();
//! assert_eq!(creds.access_key_id(), "access-key");
//! assert_eq!(creds.secret_access_key(), "secret-key");
//! ```

use crate::config::S3Config;
use aws_credential_types::Credentials;
use thiserror::Error;

/// Provider name attached to credentials taken from the config file
const CONFIG_PROVIDER_NAME: &str = "s3-put-config";

/// Credential loading errors
#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
}

/// Factory for the credentials handed to the SDK
pub struct CredentialsProvider;

impl CredentialsProvider {
    /// Static credentials from `S3Config`
    ///
    /// Returns `Ok(None)` when neither key is configured, meaning the SDK
    /// default chain should be used instead.
    pub fn from_config(config: &S3Config) -> Result<Option<Credentials>, CredentialsError> {
        let (access_key, secret_key) = match (&config.access_key, &config.secret_key) {
            (None, None) => return Ok(None),
            (Some(access), Some(secret)) => (access, secret),
            (None, Some(_)) => {
                return Err(CredentialsError::MissingCredentials(
                    "access_key not set in config".into(),
                ))
            }
            (Some(_), None) => {
                return Err(CredentialsError::MissingCredentials(
                    "secret_key not set in config".into(),
                ))
            }
        };

        if access_key.trim().is_empty() || secret_key.trim().is_empty() {
            return Err(CredentialsError::InvalidCredentials(
                "access_key and secret_key cannot be blank".into(),
            ));
        }

        Ok(Some(Credentials::new(
            access_key.trim(),
            secret_key.trim(),
            config.session_token.clone(),
            None,
            CONFIG_PROVIDER_NAME,
        )))
    }
}
