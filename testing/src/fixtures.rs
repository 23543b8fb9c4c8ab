use cip_core::{ConfigEntry, KeyValueClient};
use errors::StorageError;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const BACKEND: &str = "memory";

/// In-memory stand-in for an etcd server.
///
/// Values live at full paths; directories exist implicitly while they have
/// descendants, as with etcd v2 keys created under missing parents.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<BTreeMap<String, String>>,
    writes: Mutex<Vec<String>>,
    unreachable: bool
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that fails every call as if the server could not be reached.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Seeds a value without recording it as a client write.
    pub fn insert(&self, path: &str, value: &str) {
        self.values
            .lock()
            .insert(normalize(path).to_string(), value.to_string());
    }

    pub fn value(&self, path: &str) -> Option<String> {
        self.values.lock().get(normalize(path)).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        self.values.lock().keys().cloned().collect()
    }

    /// Paths written through [`KeyValueClient::write`], in call order.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().clone()
    }

    fn check_reachable(&self) -> Result<(), StorageError> {
        if self.unreachable {
            tracing::debug!("memory store configured as unreachable");
            return Err(StorageError::ConnectionError {
                backend: BACKEND.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

impl KeyValueClient for MemoryKeyValueStore {
    fn exists(&self, path: &str) -> Result<bool, StorageError> {
        self.check_reachable()?;
        let path = normalize(path);
        let prefix = format!("{}/", path);
        Ok(self
            .values
            .lock()
            .keys()
            .any(|k| k == path || k.starts_with(&prefix)))
    }

    fn read_children(&self, path: &str) -> Result<Vec<ConfigEntry>, StorageError> {
        if !self.exists(path)? {
            return Err(StorageError::NotFound {
                backend: BACKEND.to_string(),
                id: path.to_string(),
            });
        }
        let prefix = format!("{}/", normalize(path));
        Ok(self
            .values
            .lock()
            .iter()
            .filter_map(|(k, v)| {
                let name = k.strip_prefix(&prefix)?;
                (!name.contains('/')).then(|| ConfigEntry::new(name, v.clone()))
            })
            .collect())
    }

    fn write(&self, path: &str, value: &str) -> Result<(), StorageError> {
        self.check_reachable()?;
        let path = normalize(path);
        let mut values = self.values.lock();

        // A value node cannot gain children.
        let mut parent = path;
        while let Some((head, _)) = parent.rsplit_once('/') {
            if values.contains_key(head) {
                return Err(StorageError::QueryError {
                    backend: BACKEND.to_string(),
                    reason: format!("Not a directory: {}", head),
                });
            }
            parent = head;
        }

        values.insert(path.to_string(), value.to_string());
        self.writes.lock().push(path.to_string());
        Ok(())
    }

    fn endpoint(&self) -> String {
        "memory://".to_string()
    }
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

/// Temporary directory for file-backed configuration, removed on drop.
pub struct ConfigDir {
    dir: TempDir
}

impl ConfigDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temporary config directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

impl Default for ConfigDir {
    fn default() -> Self {
        Self::new()
    }
}
