use cip_core::{ConfigEntry, KeyValueClient};
use errors::StorageError;
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

const BACKEND: &str = "etcd";

/// etcd v2 error code for "Key not found".
const ERROR_KEY_NOT_FOUND: u64 = 100;

/// Connection settings for [`EtcdClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtcdClientConfig {
    /// Base URL of the etcd server, e.g. `http://127.0.0.1:4001`
    pub url: String,
    /// Per-request timeout enforced by the HTTP client
    pub timeout: Duration,
}

impl EtcdClientConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct KeysResponse {
    node: Node,
}

#[derive(Debug, Deserialize)]
struct Node {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    dir: bool,
    #[serde(default)]
    nodes: Vec<Node>,
}

#[derive(Debug, Deserialize)]
struct EtcdErrorBody {
    #[serde(rename = "errorCode")]
    error_code: u64,
    message: String,
    #[serde(default)]
    cause: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    #[serde(rename = "etcdserver")]
    server: String,
}

/// Blocking client for the etcd v2 keys API.
///
/// Idle connections are not pooled: the connection used by a call is closed
/// once the call returns, on success and error paths alike.
pub struct EtcdClient {
    base: Url,
    client: Client,
}

impl EtcdClient {
    pub fn new(url: &str) -> Result<Self, StorageError> {
        Self::with_config(&EtcdClientConfig::new(url))
    }

    pub fn with_config(config: &EtcdClientConfig) -> Result<Self, StorageError> {
        let base = Url::parse(&config.url).map_err(|e| StorageError::ConnectionError {
            backend: BACKEND.to_string(),
            reason: format!("invalid URL {}: {}", config.url, e),
        })?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(StorageError::ConnectionError {
                backend: BACKEND.to_string(),
                reason: format!("unsupported URL {}", config.url),
            });
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| StorageError::ConnectionError {
                backend: BACKEND.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { base, client })
    }

    /// Version string reported by the etcd server.
    pub fn server_version(&self) -> Result<String, StorageError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| query_error("URL cannot carry a path"))?
            .pop_if_empty()
            .push("version");

        let response = self.client.get(url).send().map_err(connection_error)?;
        if !response.status().is_success() {
            return Err(unexpected_status(response));
        }
        let version: VersionResponse = response.json().map_err(serialization_error)?;
        Ok(version.server)
    }

    fn key_url(&self, path: &str) -> Result<Url, StorageError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| query_error("URL cannot carry a path"))?
            .pop_if_empty()
            .extend(["v2", "keys"])
            .extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }
}

impl KeyValueClient for EtcdClient {
    fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let url = self.key_url(path)?;
        tracing::debug!(%url, "checking etcd key");

        let response = self.client.get(url).send().map_err(connection_error)?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => {
                let body = error_body(response)?;
                if body.error_code == ERROR_KEY_NOT_FOUND {
                    Ok(false)
                } else {
                    Err(etcd_error(&body))
                }
            }
            _ => Err(unexpected_status(response)),
        }
    }

    fn read_children(&self, path: &str) -> Result<Vec<ConfigEntry>, StorageError> {
        let mut url = self.key_url(path)?;
        url.query_pairs_mut().append_pair("recursive", "true");
        tracing::debug!(%url, "reading etcd directory");

        let response = self.client.get(url).send().map_err(connection_error)?;
        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                let body = error_body(response)?;
                return Err(if body.error_code == ERROR_KEY_NOT_FOUND {
                    StorageError::NotFound {
                        backend: BACKEND.to_string(),
                        id: path.to_string(),
                    }
                } else {
                    etcd_error(&body)
                });
            }
            _ => return Err(unexpected_status(response)),
        }

        let listing: KeysResponse = response.json().map_err(serialization_error)?;
        if !listing.node.dir {
            return Err(query_error(&format!("{} is not a directory", path)));
        }

        Ok(listing
            .node
            .nodes
            .into_iter()
            .filter(|node| !node.dir)
            .filter_map(|node| {
                let name = node.key?.rsplit('/').next()?.to_string();
                Some(ConfigEntry::new(name, node.value.unwrap_or_default()))
            })
            .collect())
    }

    fn write(&self, path: &str, value: &str) -> Result<(), StorageError> {
        let url = self.key_url(path)?;
        tracing::debug!(%url, "writing etcd key");

        let response = self
            .client
            .put(url)
            .form(&[("value", value)])
            .send()
            .map_err(connection_error)?;
        match response.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(()),
            status if status.is_client_error() => Err(etcd_error(&error_body(response)?)),
            _ => Err(unexpected_status(response)),
        }
    }

    fn endpoint(&self) -> String {
        self.base.to_string()
    }
}

fn error_body(response: Response) -> Result<EtcdErrorBody, StorageError> {
    let status = response.status();
    response.json().map_err(|e| StorageError::QueryError {
        backend: BACKEND.to_string(),
        reason: format!("unexpected {} response: {}", status, e),
    })
}

fn etcd_error(body: &EtcdErrorBody) -> StorageError {
    let reason = match &body.cause {
        Some(cause) => format!("{} ({}): {}", body.message, body.error_code, cause),
        None => format!("{} ({})", body.message, body.error_code),
    };
    StorageError::QueryError {
        backend: BACKEND.to_string(),
        reason,
    }
}

fn unexpected_status(response: Response) -> StorageError {
    query_error(&format!("unexpected status {}", response.status()))
}

fn query_error(reason: &str) -> StorageError {
    StorageError::QueryError {
        backend: BACKEND.to_string(),
        reason: reason.to_string(),
    }
}

fn connection_error(e: reqwest::Error) -> StorageError {
    StorageError::ConnectionError {
        backend: BACKEND.to_string(),
        reason: e.to_string(),
    }
}

fn serialization_error(e: reqwest::Error) -> StorageError {
    StorageError::SerializationError {
        error_type: "JSON".to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_url_encodes_segments() {
        let client = EtcdClient::new("http://127.0.0.1:4001").unwrap();
        let url = client.key_url("ciao/my app/v1").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:4001/v2/keys/ciao/my%20app/v1");
    }

    #[test]
    fn test_key_url_keeps_base_path() {
        let client = EtcdClient::new("http://etcd.local/proxy/").unwrap();
        let url = client.key_url("ciao/app/v1/key").unwrap();
        assert_eq!(url.as_str(), "http://etcd.local/proxy/v2/keys/ciao/app/v1/key");
    }

    #[test]
    fn test_invalid_url_is_connection_error() {
        let result = EtcdClient::new("not a url");
        assert!(matches!(result, Err(StorageError::ConnectionError { .. })));
    }

    #[test]
    fn test_non_http_scheme_is_rejected() {
        let result = EtcdClient::new("mailto:ops@example.com");
        assert!(matches!(result, Err(StorageError::ConnectionError { .. })));
    }

    #[test]
    fn test_config_default_timeout() {
        let config = EtcdClientConfig::new("http://127.0.0.1:4001");
        assert_eq!(config.timeout, Duration::from_secs(30));
        let config = config.with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
