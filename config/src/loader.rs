//! # Bootstrap Options
//!
//! Inputs to the bootstrap protocol, built in code or from environment
//! variables.
//!
//! # Environment Variables
//! - `CIAO_ETCD_URL`: etcd base URL; selects the network backend
//! - `CIAO_CONFIG_PATH`: directory holding `.properties` files
//! - `CIAO_ETCD_TIMEOUT_SECONDS`: etcd request timeout (default: 30)
//!
//! Empty values are treated as unset.

use cip_core::CipIdentity;
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use storage::EtcdClientConfig;

pub const ENV_ETCD_URL: &str = "CIAO_ETCD_URL";
pub const ENV_CONFIG_PATH: &str = "CIAO_CONFIG_PATH";
pub const ENV_ETCD_TIMEOUT_SECONDS: &str = "CIAO_ETCD_TIMEOUT_SECONDS";

/// Environment loading error.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Everything the bootstrap protocol needs to resolve one configuration set.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Carries the backend locator (etcd URL or file directory, at most one of
/// which is used), the CIP identity and the defaults seeded on first run.
///
/// ## Usage
/// ```rust,no_run
/// use cip_core::CipIdentity;
/// use config::{BootstrapOptions, CiaoConfig};
/// use std::collections::BTreeMap;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let defaults = BTreeMap::from([("port".to_string(), "8080".to_string())]);
///     let options = BootstrapOptions::new(CipIdentity::new("ciao-docs-parser", "v1"))
///         .with_network_url("http://127.0.0.1:4001")
///         .with_defaults(defaults);
///     let config = CiaoConfig::bootstrap(options)?;
///     println!("port: {:?}", config.config_value("port")?);
///     Ok(())
/// }
/// ```
///
/// ## Logging
/// `with_dispatch` hands the bootstrap an explicit `tracing` dispatcher;
/// without it events go to the caller's current default subscriber.
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    pub network_url: Option<String>,
    pub file_path: Option<PathBuf>,
    pub identity: CipIdentity,
    pub defaults: Option<BTreeMap<String, String>>,
    pub etcd_timeout: Duration,
    pub dispatch: Option<tracing::Dispatch>,
}

impl BootstrapOptions {
    pub fn new(identity: CipIdentity) -> Self {
        Self {
            network_url: None,
            file_path: None,
            identity,
            defaults: None,
            etcd_timeout: EtcdClientConfig::DEFAULT_TIMEOUT,
            dispatch: None,
        }
    }

    pub fn with_network_url(mut self, url: impl Into<String>) -> Self {
        self.network_url = Some(url.into());
        self
    }

    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_defaults(mut self, defaults: BTreeMap<String, String>) -> Self {
        self.defaults = Some(defaults);
        self
    }

    pub fn with_etcd_timeout(mut self, timeout: Duration) -> Self {
        self.etcd_timeout = timeout;
        self
    }

    pub fn with_dispatch(mut self, dispatch: tracing::Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn etcd_config(&self) -> Option<EtcdClientConfig> {
        self.network_url
            .as_ref()
            .map(|url| EtcdClientConfig::new(url.clone()).with_timeout(self.etcd_timeout))
    }
}

/// Builds bootstrap options for `identity` from `CIAO_*` environment
/// variables. Defaults must still be attached by the caller.
pub fn load_from_env(identity: CipIdentity) -> Result<BootstrapOptions, LoaderError> {
    let mut options = BootstrapOptions::new(identity);
    options.network_url = non_empty_env(ENV_ETCD_URL);
    options.file_path = non_empty_env(ENV_CONFIG_PATH).map(PathBuf::from);
    if let Some(seconds) = parse_env::<u64>(ENV_ETCD_TIMEOUT_SECONDS)? {
        if seconds == 0 {
            return Err(LoaderError::InvalidValue {
                key: ENV_ETCD_TIMEOUT_SECONDS.to_string(),
                value: seconds.to_string(),
                reason: "timeout must be at least one second".to_string(),
            });
        }
        options.etcd_timeout = Duration::from_secs(seconds);
    }
    Ok(options)
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str) -> Result<Option<T>, LoaderError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty_env(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| LoaderError::InvalidValue {
                key: key.to_string(),
                value: value.clone(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}
