//! # CIAO Configuration Errors
//!
//! Error taxonomy for the CIAO configuration system.
//!
//! Two layers:
//! - [`StorageError`]: raised by storage media (etcd client, file codec).
//!   Never crosses the configuration facade.
//! - [`ConfigurationError`]: the only error type returned to callers of
//!   property stores and the `CiaoConfig` facade.
//!
//! Uses `thiserror` for structured error definitions with named fields.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad category of a [`ConfigurationError`].
///
/// Useful for callers (and the CLI) that map failures onto exit codes
/// without matching on every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    StoreUnavailable,
    NotFound,
    MissingDefaults,
    InvalidDefaults,
    NotInitialised,
    InvalidIdentity,
}

/// Configuration errors surfaced by property stores and the facade.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Configuration store {backend} unavailable: {reason}")]
    StoreUnavailable { backend: String, reason: String },

    #[error("No configuration found for {identity}")]
    NotFound { identity: String },

    #[error("No default CIP config was provided for {identity} - unable to initialise CIP")]
    MissingDefaults { identity: String },

    #[error("Invalid default config for {identity}: {reason}")]
    InvalidDefaults { identity: String, reason: String },

    #[error("Configuration not initialised correctly - see error logs for details")]
    NotInitialised,

    #[error("Invalid CIP identity: {reason}")]
    InvalidIdentity { reason: String }
}

impl ConfigurationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::StoreUnavailable { .. } => ErrorKind::StoreUnavailable,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::MissingDefaults { .. } => ErrorKind::MissingDefaults,
            Self::InvalidDefaults { .. } => ErrorKind::InvalidDefaults,
            Self::NotInitialised => ErrorKind::NotInitialised,
            Self::InvalidIdentity { .. } => ErrorKind::InvalidIdentity,
        }
    }

    /// Wraps a storage-level failure for `identity` held by `backend`.
    ///
    /// `StorageError::NotFound` keeps its meaning; every other storage
    /// failure means the store could not be used.
    pub fn from_storage(backend: &str, identity: &str, err: StorageError) -> Self {
        match err {
            StorageError::NotFound { .. } => Self::NotFound {
                identity: identity.to_string(),
            },
            other => {
                tracing::debug!(backend, error = %other, "storage failure");
                Self::StoreUnavailable {
                    backend: backend.to_string(),
                    reason: other.to_string(),
                }
            }
        }
    }
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Connection to {backend} failed: {reason}")]
    ConnectionError { backend: String, reason: String },

    #[error("Query on {backend} failed: {reason}")]
    QueryError { backend: String, reason: String },

    #[error("Serialization error: {error_type} - {reason}")]
    SerializationError { error_type: String, reason: String },

    #[error("Not found on {backend}:{id}")]
    NotFound { backend: String, id: String }
}
