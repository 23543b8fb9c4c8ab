//! # CIAO Configuration Facade
//!
//! Selects a backend, runs the bootstrap protocol against it and keeps the
//! resulting properties for the life of the process.
//!
//! # Bootstrap Protocol
//! ```text
//! Unresolved --(etcd URL given)------> BackendSelected(etcd) --+
//!            --(no etcd URL)---------> BackendSelected(file) --+
//!                                                             |
//!   version exists  -> load_config                            |
//!   version missing -> defaults given ? set_defaults          |
//!                                     : Failed(MissingDefaults)
//!   store unreachable -> Failed(StoreUnavailable)             |
//!                                                             v
//!                                                        Bootstrapped
//! ```
//! There are no retries, and a failing etcd never falls back to the file
//! backend.

use crate::file_store::FilePropertyStore;
use crate::loader::BootstrapOptions;
use crate::network_store::EtcdPropertyStore;
use cip_core::{CipIdentity, CipProperties, PropertyStore};
use errors::ConfigurationError;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Which branch of the bootstrap protocol produced the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// An existing configuration set was loaded.
    Loaded,
    /// No configuration existed; the defaults were written.
    Seeded,
}

/// The backend chosen for one bootstrap.
enum Backend {
    Network(EtcdPropertyStore),
    File(FilePropertyStore),
}

impl Backend {
    fn select(options: &BootstrapOptions) -> Result<Self, ConfigurationError> {
        match options.etcd_config() {
            Some(config) => {
                let store = EtcdPropertyStore::with_config(&config).inspect_err(|e| {
                    tracing::error!(url = %config.url, error = %e, "Can't connect to etcd URL provided");
                })?;
                Ok(Self::Network(store))
            }
            None => {
                tracing::debug!("No etcd URL provided, using local configuration");
                Ok(Self::File(FilePropertyStore::new(options.file_path.as_deref())?))
            }
        }
    }
}

/// Entry point for reading CIP configuration.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// All configuration values in a CIP should be read through this type. A
/// successfully bootstrapped `CiaoConfig` always holds properties; the
/// `Default` value holds none and fails every read with `NotInitialised`.
///
/// ## Usage
/// ```rust,no_run
/// use cip_core::CipIdentity;
/// use config::{BootstrapOptions, CiaoConfig};
/// use std::collections::BTreeMap;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let defaults = BTreeMap::from([("queue".to_string(), "inbound".to_string())]);
///     let options = BootstrapOptions::new(CipIdentity::new("ciao-cda-builder", "v1"))
///         .with_defaults(defaults);
///     let config = CiaoConfig::bootstrap(options)?;
///     for key in config.config_keys()? {
///         println!("{} = {:?}", key, config.config_value(&key)?);
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CiaoConfig {
    properties: Option<CipProperties>,
    outcome: Option<BootstrapOutcome>,
}

impl CiaoConfig {
    /// Runs the bootstrap protocol described in the module docs.
    pub fn bootstrap(options: BootstrapOptions) -> Result<Self, ConfigurationError> {
        match options.dispatch.clone() {
            Some(dispatch) => {
                tracing::dispatcher::with_default(&dispatch, || Self::bootstrap_selected(&options))
            }
            None => Self::bootstrap_selected(&options),
        }
    }

    fn bootstrap_selected(options: &BootstrapOptions) -> Result<Self, ConfigurationError> {
        let identity = &options.identity;
        let span = tracing::info_span!(
            "ciao_bootstrap",
            cip = identity.name(),
            version = identity.version(),
            classifier = identity.classifier()
        );
        let _enter = span.enter();

        identity.check()?;
        match Backend::select(options)? {
            Backend::Network(store) => {
                Self::bootstrap_with(&store, identity, options.defaults.as_ref())
            }
            Backend::File(store) => Self::bootstrap_with(&store, identity, options.defaults.as_ref()),
        }
    }

    /// Runs the load-or-seed half of the protocol against any store.
    pub fn bootstrap_with<S: PropertyStore>(
        store: S,
        identity: &CipIdentity,
        defaults: Option<&BTreeMap<String, String>>,
    ) -> Result<Self, ConfigurationError> {
        identity.check()?;
        let location = store.describe();

        let exists = store.version_exists(identity).inspect_err(|e| {
            tracing::error!(store = %location, error = %e, "Can't reach configuration store");
        })?;

        if exists {
            let properties = store.load_config(identity)?;
            tracing::info!(store = %location, "Found config");
            return Ok(Self {
                properties: Some(properties),
                outcome: Some(BootstrapOutcome::Loaded),
            });
        }

        tracing::debug!(store = %location, "Config not yet initialised for this CIP");
        let defaults = defaults.ok_or_else(|| ConfigurationError::MissingDefaults {
            identity: identity.to_string(),
        })?;
        let properties = store.set_defaults(identity, defaults)?;
        tracing::info!(store = %location, "Initialised default config for this CIP");

        Ok(Self {
            properties: Some(properties),
            outcome: Some(BootstrapOutcome::Seeded),
        })
    }

    /// Wraps properties that were resolved elsewhere.
    pub fn from_properties(properties: CipProperties) -> Self {
        Self {
            properties: Some(properties),
            outcome: None,
        }
    }

    pub fn is_initialised(&self) -> bool {
        self.properties.is_some()
    }

    /// `None` for an uninitialised facade or one built from properties.
    pub fn outcome(&self) -> Option<BootstrapOutcome> {
        self.outcome
    }

    pub fn properties(&self) -> Result<&CipProperties, ConfigurationError> {
        self.properties
            .as_ref()
            .ok_or(ConfigurationError::NotInitialised)
    }

    /// Local changes only; nothing is written back to the store.
    pub fn properties_mut(&mut self) -> Result<&mut CipProperties, ConfigurationError> {
        self.properties
            .as_mut()
            .ok_or(ConfigurationError::NotInitialised)
    }

    pub fn cip_name(&self) -> Result<&str, ConfigurationError> {
        Ok(self.properties()?.cip_name())
    }

    pub fn version(&self) -> Result<&str, ConfigurationError> {
        Ok(self.properties()?.version())
    }

    pub fn classifier(&self) -> Result<Option<&str>, ConfigurationError> {
        Ok(self.properties()?.classifier())
    }

    /// A missing key is `Ok(None)`, not an error.
    pub fn config_value(&self, key: &str) -> Result<Option<&str>, ConfigurationError> {
        Ok(self.properties()?.config_value(key))
    }

    pub fn config_keys(&self) -> Result<BTreeSet<String>, ConfigurationError> {
        Ok(self.properties()?.config_keys())
    }

    pub fn all_properties(&self) -> Result<BTreeMap<String, String>, ConfigurationError> {
        Ok(self.properties()?.all_properties())
    }
}

impl fmt::Display for CiaoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.properties {
            Some(properties) => write!(f, "{}", properties),
            None => write!(f, "Config not initialised"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network_store::CONFIGURED_KEY;
    use errors::ErrorKind;
    use testing::{MemoryKeyValueStore, test_defaults, unique_identity};

    #[test]
    fn test_uninitialised_reads_fail() {
        let config = CiaoConfig::default();
        assert!(!config.is_initialised());
        assert_eq!(config.cip_name().unwrap_err().kind(), ErrorKind::NotInitialised);
        assert_eq!(config.version().unwrap_err().kind(), ErrorKind::NotInitialised);
        assert_eq!(
            config.config_value("any").unwrap_err().kind(),
            ErrorKind::NotInitialised
        );
        assert_eq!(config.config_keys().unwrap_err().kind(), ErrorKind::NotInitialised);
        assert_eq!(
            config.all_properties().unwrap_err().kind(),
            ErrorKind::NotInitialised
        );
        assert_eq!(config.to_string(), "Config not initialised");
    }

    #[test]
    fn test_seed_then_load_through_network_store() {
        let store = EtcdPropertyStore::with_client(MemoryKeyValueStore::new());
        let identity = unique_identity();
        let defaults = test_defaults();

        let first = CiaoConfig::bootstrap_with(&store, &identity, Some(&defaults)).unwrap();
        assert_eq!(first.outcome(), Some(BootstrapOutcome::Seeded));
        assert!(!first.config_keys().unwrap().contains(CONFIGURED_KEY));

        let second = CiaoConfig::bootstrap_with(&store, &identity, Some(&defaults)).unwrap();
        assert_eq!(second.outcome(), Some(BootstrapOutcome::Loaded));
        assert!(second.config_keys().unwrap().contains(CONFIGURED_KEY));
        assert_eq!(second.config_value("testProperty1").unwrap(), Some("testValue1"));
    }

    #[test]
    fn test_existing_config_ignores_new_defaults() {
        let store = EtcdPropertyStore::with_client(MemoryKeyValueStore::new());
        let identity = unique_identity();
        CiaoConfig::bootstrap_with(&store, &identity, Some(&test_defaults())).unwrap();

        let changed = BTreeMap::from([("testProperty1".to_string(), "changed".to_string())]);
        let config = CiaoConfig::bootstrap_with(&store, &identity, Some(&changed)).unwrap();
        assert_eq!(config.config_value("testProperty1").unwrap(), Some("testValue1"));
    }

    #[test]
    fn test_missing_defaults() {
        let store = EtcdPropertyStore::with_client(MemoryKeyValueStore::new());
        let err = CiaoConfig::bootstrap_with(&store, &unique_identity(), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingDefaults);
        assert!(store.client().paths().is_empty());
    }

    #[test]
    fn test_loaded_config_needs_no_defaults() {
        let store = EtcdPropertyStore::with_client(MemoryKeyValueStore::new());
        let identity = unique_identity();
        CiaoConfig::bootstrap_with(&store, &identity, Some(&test_defaults())).unwrap();
        let config = CiaoConfig::bootstrap_with(&store, &identity, None).unwrap();
        assert_eq!(config.outcome(), Some(BootstrapOutcome::Loaded));
    }

    #[test]
    fn test_unreachable_store() {
        let store = EtcdPropertyStore::with_client(MemoryKeyValueStore::unreachable());
        let err =
            CiaoConfig::bootstrap_with(&store, &unique_identity(), Some(&test_defaults()))
                .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    }

    #[test]
    fn test_invalid_identity_touches_nothing() {
        let store = EtcdPropertyStore::with_client(MemoryKeyValueStore::new());
        let identity = CipIdentity::new("bad/name", "v1");
        let err = CiaoConfig::bootstrap_with(&store, &identity, Some(&test_defaults()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidIdentity);
        assert!(store.client().writes().is_empty());
    }

    #[test]
    fn test_from_properties_and_local_mutation() {
        let properties = CipProperties::new(
            CipIdentity::new("app", "v1").with_classifier("blue"),
            [("a", "1")],
        );
        let mut config = CiaoConfig::from_properties(properties);
        assert_eq!(config.outcome(), None);
        assert_eq!(config.cip_name().unwrap(), "app");
        assert_eq!(config.version().unwrap(), "v1");
        assert_eq!(config.classifier().unwrap(), Some("blue"));

        config.properties_mut().unwrap().add_config_value("b", "2");
        config.properties_mut().unwrap().remove_key("a");
        assert_eq!(
            config.all_properties().unwrap(),
            BTreeMap::from([("b".to_string(), "2".to_string())])
        );
        assert!(config.to_string().contains("b = 2"));
    }
}
