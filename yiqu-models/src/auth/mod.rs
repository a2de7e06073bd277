//! Credential management for the chat service.
//!
//! Spark needs three values: an app id, an API key and an API secret. They are
//! kept in the system keyring, with environment variables as a fallback for CI
//! and deployment.
//!
//! # Example
//!
//! ```ignore
//! use yiqu_models::auth::{CredentialField, CredentialStore};
//!
//! let store = CredentialStore::new("yiqu").with_env_fallback();
//!
//! // Store the secret in the system keyring
//! store.set(CredentialField::ApiSecret, "...")?;
//!
//! // Load all three (keyring first, then SPARK_* env vars)
//! let credentials = store.spark_credentials()?;
//! ```

use std::env;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::{Error, Result};

/// A secret value that prevents accidental logging.
///
/// The value is wrapped in `SecretString` which:
/// - Implements `Debug` as `"[REDACTED]"`
/// - Zeroizes memory on drop
/// - Requires explicit `.expose_secret()` to access the value
#[derive(Clone)]
pub struct Secret(SecretString);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    /// Expose the secret value.
    ///
    /// Use sparingly - only when actually signing a request.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl From<String> for Secret {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One stored credential value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialField {
    AppId,
    ApiKey,
    ApiSecret,
}

impl CredentialField {
    pub const ALL: [CredentialField; 3] = [
        CredentialField::AppId,
        CredentialField::ApiKey,
        CredentialField::ApiSecret,
    ];

    /// Keyring account name.
    pub fn key(self) -> &'static str {
        match self {
            Self::AppId => "spark.app_id",
            Self::ApiKey => "spark.api_key",
            Self::ApiSecret => "spark.api_secret",
        }
    }

    /// Environment variable consulted when fallback is enabled.
    pub fn env_var(self) -> &'static str {
        match self {
            Self::AppId => "SPARK_APPID",
            Self::ApiKey => "SPARK_API_KEY",
            Self::ApiSecret => "SPARK_API_SECRET",
        }
    }
}

impl std::fmt::Display for CredentialField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Everything needed to sign a Spark request.
#[derive(Debug, Clone)]
pub struct SparkCredentials {
    pub app_id: String,
    pub api_key: Secret,
    pub api_secret: Secret,
}

/// Secure credential storage with system keyring and environment fallback.
///
/// # Storage Priority
///
/// When retrieving credentials:
/// 1. System keyring (if available)
/// 2. Environment variables (if `env_fallback` is enabled)
///
/// When storing credentials:
/// - Always uses system keyring
/// - Environment variables are read-only
pub struct CredentialStore {
    service_name: String,
    env_fallback: bool,
}

impl CredentialStore {
    /// Create a new credential store.
    ///
    /// # Arguments
    ///
    /// * `service_name` - Service identifier for keyring (e.g., "yiqu")
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            env_fallback: false,
        }
    }

    /// Enable environment variable fallback.
    pub fn with_env_fallback(mut self) -> Self {
        self.env_fallback = true;
        self
    }

    /// Get one credential value.
    ///
    /// # Errors
    ///
    /// Returns `Error::CredentialsNotFound` if the value is in neither source.
    pub fn get(&self, field: CredentialField) -> Result<Secret> {
        if let Some(value) = self.get_from_keyring(field) {
            debug!(%field, "retrieved credential from keyring");
            return Ok(value);
        }

        if self.env_fallback
            && let Some(value) = self.get_from_env(field)
        {
            debug!(%field, "retrieved credential from environment");
            return Ok(value);
        }

        Err(Error::CredentialsNotFound(field.to_string()))
    }

    /// Load all three Spark values.
    pub fn spark_credentials(&self) -> Result<SparkCredentials> {
        Ok(SparkCredentials {
            app_id: self.get(CredentialField::AppId)?.expose_secret().to_string(),
            api_key: self.get(CredentialField::ApiKey)?,
            api_secret: self.get(CredentialField::ApiSecret)?,
        })
    }

    /// Store a value in the system keyring.
    ///
    /// # Errors
    ///
    /// Returns `Error::Keyring` if the keyring operation fails.
    pub fn set(&self, field: CredentialField, value: &str) -> Result<()> {
        let entry = self.keyring_entry(field)?;
        entry
            .set_password(value)
            .map_err(|e| Error::Keyring(e.to_string()))?;
        debug!(%field, "stored credential in keyring");
        Ok(())
    }

    /// Delete a value from the system keyring.
    ///
    /// # Errors
    ///
    /// Returns `Error::Keyring` if the keyring operation fails.
    /// Returns `Error::CredentialsNotFound` if nothing was stored.
    pub fn delete(&self, field: CredentialField) -> Result<()> {
        let entry = self.keyring_entry(field)?;
        entry.delete_credential().map_err(|e| match e {
            keyring::Error::NoEntry => Error::CredentialsNotFound(field.to_string()),
            _ => Error::Keyring(e.to_string()),
        })?;
        debug!(%field, "deleted credential from keyring");
        Ok(())
    }

    /// Check if a value exists in either source.
    pub fn has(&self, field: CredentialField) -> bool {
        self.get(field).is_ok()
    }

    /// Get the source of a credential (keyring or env).
    pub fn credential_source(&self, field: CredentialField) -> Option<CredentialSource> {
        if self.get_from_keyring(field).is_some() {
            Some(CredentialSource::Keyring)
        } else if self.env_fallback && self.get_from_env(field).is_some() {
            Some(CredentialSource::Environment)
        } else {
            None
        }
    }

    fn keyring_entry(&self, field: CredentialField) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service_name, field.key())
            .map_err(|e| Error::Keyring(e.to_string()))
    }

    fn get_from_keyring(&self, field: CredentialField) -> Option<Secret> {
        let entry = self.keyring_entry(field).ok()?;
        entry.get_password().ok().map(Secret::new)
    }

    fn get_from_env(&self, field: CredentialField) -> Option<Secret> {
        env::var(field.env_var())
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(Secret::new)
    }
}

/// Source of a stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Stored in system keyring.
    Keyring,
    /// From environment variable.
    Environment,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keyring => f.write_str("keyring"),
            Self::Environment => f.write_str("environment"),
        }
    }
}
