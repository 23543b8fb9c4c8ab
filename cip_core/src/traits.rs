use crate::properties::CipProperties;
use crate::types::{CipIdentity, ConfigEntry};
use errors::{ConfigurationError, StorageError};
use std::collections::BTreeMap;

/// Capability shared by every configuration backend.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Reports whether a versioned configuration set exists, loads it, or seeds
/// it with defaults. The bootstrap protocol only talks to this trait.
///
/// ## Contract
/// - `version_exists` never mutates storage.
/// - `load_config` fails with `NotFound` when the set does not exist.
/// - `set_defaults` expects the set to be absent (callers check first),
///   writes every default and returns exactly those values.
/// - Unreachable or unwritable storage fails with `StoreUnavailable`.
pub trait PropertyStore {
    fn version_exists(&self, identity: &CipIdentity) -> Result<bool, ConfigurationError>;

    fn load_config(&self, identity: &CipIdentity) -> Result<CipProperties, ConfigurationError>;

    fn set_defaults(
        &self,
        identity: &CipIdentity,
        defaults: &BTreeMap<String, String>,
    ) -> Result<CipProperties, ConfigurationError>;

    /// Where this store keeps its data, for log output.
    fn describe(&self) -> String;
}

impl<T: PropertyStore + ?Sized> PropertyStore for &T {
    fn version_exists(&self, identity: &CipIdentity) -> Result<bool, ConfigurationError> {
        (**self).version_exists(identity)
    }

    fn load_config(&self, identity: &CipIdentity) -> Result<CipProperties, ConfigurationError> {
        (**self).load_config(identity)
    }

    fn set_defaults(
        &self,
        identity: &CipIdentity,
        defaults: &BTreeMap<String, String>,
    ) -> Result<CipProperties, ConfigurationError> {
        (**self).set_defaults(identity, defaults)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Hierarchical key-value service addressed by `/`-separated paths.
///
/// Paths are relative (no leading `/`). A path exists when it holds a value
/// or has children.
pub trait KeyValueClient {
    fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Direct leaf children of `path`, named by their last path segment.
    ///
    /// Fails with `StorageError::NotFound` when `path` does not exist.
    fn read_children(&self, path: &str) -> Result<Vec<ConfigEntry>, StorageError>;

    /// Writes `value` at `path`, creating parent directories as needed.
    fn write(&self, path: &str, value: &str) -> Result<(), StorageError>;

    /// Address of the service, for log output.
    fn endpoint(&self) -> String;
}
