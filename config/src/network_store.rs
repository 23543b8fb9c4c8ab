//! # etcd Property Store
//!
//! Keeps each configuration set under `ciao/<name>/<version>[/<classifier>]`,
//! one child node per key.

use crate::check_defaults;
use cip_core::{CipIdentity, CipProperties, KeyValueClient, PropertyStore};
use errors::{ConfigurationError, StorageError};
use std::collections::BTreeMap;
use storage::{EtcdClient, EtcdClientConfig};

/// Reserved key written when a persisted set is loaded from etcd.
///
/// Only the network backend writes it, and only on load, so its presence
/// tells a once-loaded set apart from one that was just seeded.
pub const CONFIGURED_KEY: &str = "configured";
pub const CONFIGURED_VALUE: &str = "true";

const ROOT: &str = "ciao";
const BACKEND: &str = "etcd";

pub struct EtcdPropertyStore<C = EtcdClient> {
    client: C
}

impl EtcdPropertyStore<EtcdClient> {
    pub fn new(url: &str) -> Result<Self, ConfigurationError> {
        Self::with_config(&EtcdClientConfig::new(url))
    }

    pub fn with_config(config: &EtcdClientConfig) -> Result<Self, ConfigurationError> {
        let client = EtcdClient::with_config(config).map_err(|e| {
            ConfigurationError::StoreUnavailable {
                backend: BACKEND.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self { client })
    }
}

impl<C: KeyValueClient> EtcdPropertyStore<C> {
    pub fn with_client(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// `ciao/<name>/<version>[/<classifier>]`
    pub fn identity_path(identity: &CipIdentity) -> String {
        let mut path = String::from(ROOT);
        for segment in identity.segments() {
            path.push('/');
            path.push_str(segment);
        }
        path
    }

    fn wrap(&self, identity: &CipIdentity, err: StorageError) -> ConfigurationError {
        ConfigurationError::from_storage(
            &format!("{} at {}", BACKEND, self.client.endpoint()),
            &identity.to_string(),
            err,
        )
    }
}

impl<C: KeyValueClient> PropertyStore for EtcdPropertyStore<C> {
    fn version_exists(&self, identity: &CipIdentity) -> Result<bool, ConfigurationError> {
        let path = Self::identity_path(identity);
        self.client
            .exists(&path)
            .map_err(|e| self.wrap(identity, e))
    }

    fn load_config(&self, identity: &CipIdentity) -> Result<CipProperties, ConfigurationError> {
        let path = Self::identity_path(identity);
        let entries = self
            .client
            .read_children(&path)
            .map_err(|e| self.wrap(identity, e))?;

        let mut properties = CipProperties::from_entries(identity.clone(), entries);

        self.client
            .write(&format!("{}/{}", path, CONFIGURED_KEY), CONFIGURED_VALUE)
            .map_err(|e| self.wrap(identity, e))?;
        properties.add_config_value(CONFIGURED_KEY, CONFIGURED_VALUE);

        tracing::debug!(path = %path, keys = properties.len(), "loaded etcd config");
        Ok(properties)
    }

    fn set_defaults(
        &self,
        identity: &CipIdentity,
        defaults: &BTreeMap<String, String>,
    ) -> Result<CipProperties, ConfigurationError> {
        check_defaults(identity, defaults)?;
        for key in defaults.keys() {
            if let Some(reason) = unusable_key(key) {
                return Err(ConfigurationError::InvalidDefaults {
                    identity: identity.to_string(),
                    reason: format!("key {:?} {}", key, reason),
                });
            }
        }

        let path = Self::identity_path(identity);
        for (key, value) in defaults {
            self.client
                .write(&format!("{}/{}", path, key), value)
                .map_err(|e| self.wrap(identity, e))?;
        }

        tracing::debug!(path = %path, keys = defaults.len(), "seeded etcd config");
        Ok(CipProperties::new(identity.clone(), defaults.clone()))
    }

    fn describe(&self) -> String {
        self.client.endpoint()
    }
}

/// Keys etcd would not store as a visible child node of the set.
fn unusable_key(key: &str) -> Option<&'static str> {
    if key.contains('/') {
        Some("contains '/'")
    } else if key == "." || key == ".." {
        Some("is a relative path segment")
    } else if key.starts_with('_') {
        Some("starts with '_', which etcd hides from listings")
    } else {
        None
    }
}
