//! # CIAO Configuration
//!
//! Bootstraps versioned configuration for a CIP.
//!
//! The first time a CIP runs with an etcd URL it connects to etcd and looks
//! for `ciao/<name>/<version>[/<classifier>]`. Existing configuration is
//! loaded; otherwise the CIP's defaults are written there. An unreachable
//! etcd is an error, never a reason to fall back to a local file.
//!
//! Without an etcd URL the CIP uses `<name>-<version>[-<classifier>].properties`
//! in the given directory, or in `~/.ciao`, creating it from the defaults on
//! first run.
//!
//! All configuration values should be read through [`CiaoConfig`].

pub mod facade;
pub mod file_loader;
pub mod file_store;
pub mod loader;
pub mod network_store;

pub use facade::{BootstrapOutcome, CiaoConfig};
pub use file_loader::{ConfigFileError, load_defaults};
pub use file_store::FilePropertyStore;
pub use loader::{BootstrapOptions, LoaderError, load_from_env};
pub use network_store::{CONFIGURED_KEY, EtcdPropertyStore};

use cip_core::CipIdentity;
use errors::ConfigurationError;
use std::collections::BTreeMap;

/// Rejects default sets that could not be seeded meaningfully.
pub(crate) fn check_defaults(
    identity: &CipIdentity,
    defaults: &BTreeMap<String, String>,
) -> Result<(), ConfigurationError> {
    if defaults.is_empty() {
        return Err(ConfigurationError::InvalidDefaults {
            identity: identity.to_string(),
            reason: "no default values supplied".to_string(),
        });
    }
    if defaults.keys().any(|k| k.is_empty()) {
        return Err(ConfigurationError::InvalidDefaults {
            identity: identity.to_string(),
            reason: "default keys must not be empty".to_string(),
        });
    }
    Ok(())
}
