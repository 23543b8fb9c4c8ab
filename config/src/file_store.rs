//! # File Property Store
//!
//! Keeps each configuration set in `<name>-<version>[-<classifier>].properties`
//! inside a configuration directory (`~/.ciao` unless one is given).

use crate::check_defaults;
use cip_core::{CipIdentity, CipProperties, PropertyStore};
use errors::{ConfigurationError, StorageError};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use storage::properties;
use tempfile::NamedTempFile;

/// Directory under the user's home used when no path is supplied.
pub const DEFAULT_DIRECTORY: &str = ".ciao";
pub const FILE_EXTENSION: &str = "properties";

const BACKEND: &str = "file";

#[derive(Debug, Clone)]
pub struct FilePropertyStore {
    directory: PathBuf
}

impl FilePropertyStore {
    /// Resolves the configuration directory, creating it when missing.
    ///
    /// # M-CANONICAL-DOCS
    ///
    /// ## Purpose
    /// Uses `path` when given, otherwise `~/.ciao`.
    ///
    /// ## Error Handling
    /// Returns `StoreUnavailable` when there is no home directory, the
    /// directory cannot be created, or the path exists but is not a
    /// directory.
    pub fn new(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let directory = match path {
            Some(path) => path.to_path_buf(),
            None => dirs::home_dir()
                .ok_or_else(|| unavailable(Path::new("~"), "no home directory"))?
                .join(DEFAULT_DIRECTORY),
        };

        if !directory.exists() {
            tracing::debug!(path = %directory.display(), "creating config directory");
            fs::create_dir_all(&directory)
                .map_err(|e| unavailable(&directory, &e.to_string()))?;
        } else if !directory.is_dir() {
            return Err(unavailable(&directory, "not a directory"));
        }

        Ok(Self { directory })
    }

    pub fn path(&self) -> &Path {
        &self.directory
    }

    /// `<name>-<version>[-<classifier>].properties`
    pub fn file_name(identity: &CipIdentity) -> String {
        format!("{}.{}", identity.segments().join("-"), FILE_EXTENSION)
    }

    pub fn file_path(&self, identity: &CipIdentity) -> PathBuf {
        self.directory.join(Self::file_name(identity))
    }

    fn write_file(&self, target: &Path, contents: &str) -> io::Result<()> {
        let mut file = NamedTempFile::new_in(&self.directory)?;
        file.write_all(contents.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(target).map_err(|e| e.error)?;
        Ok(())
    }
}

impl PropertyStore for FilePropertyStore {
    fn version_exists(&self, identity: &CipIdentity) -> Result<bool, ConfigurationError> {
        let file = self.file_path(identity);
        match fs::metadata(&file) {
            Ok(metadata) if metadata.is_file() => Ok(true),
            Ok(_) => Err(unavailable(&file, "not a regular file")),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(unavailable(&file, &e.to_string())),
        }
    }

    fn load_config(&self, identity: &CipIdentity) -> Result<CipProperties, ConfigurationError> {
        let file = self.file_path(identity);
        let contents = fs::read_to_string(&file).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ConfigurationError::NotFound {
                    identity: identity.to_string(),
                }
            } else {
                unavailable(&file, &e.to_string())
            }
        })?;

        let values = properties::parse(&contents).map_err(|e: StorageError| {
            ConfigurationError::from_storage(
                &format!("{} {}", BACKEND, file.display()),
                &identity.to_string(),
                e,
            )
        })?;

        tracing::debug!(path = %file.display(), keys = values.len(), "loaded file config");
        Ok(CipProperties::new(identity.clone(), values))
    }

    fn set_defaults(
        &self,
        identity: &CipIdentity,
        defaults: &BTreeMap<String, String>,
    ) -> Result<CipProperties, ConfigurationError> {
        check_defaults(identity, defaults)?;

        let file = self.file_path(identity);
        let header = format!("CIAO configuration for {}", identity);
        let contents = properties::render(defaults, Some(&header));
        self.write_file(&file, &contents)
            .map_err(|e| unavailable(&file, &e.to_string()))?;

        tracing::debug!(path = %file.display(), keys = defaults.len(), "seeded file config");
        Ok(CipProperties::new(identity.clone(), defaults.clone()))
    }

    fn describe(&self) -> String {
        self.directory.display().to_string()
    }
}

fn unavailable(path: &Path, reason: &str) -> ConfigurationError {
    ConfigurationError::StoreUnavailable {
        backend: format!("{} {}", BACKEND, path.display()),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use errors::ErrorKind;
    use std::collections::BTreeSet;
    use testing::{ConfigDir, TEST_CIP_NAME, TEST_VERSION, test_defaults};

    fn identity() -> CipIdentity {
        CipIdentity::new(TEST_CIP_NAME, TEST_VERSION)
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            FilePropertyStore::file_name(&identity()),
            "ciao-configuration-test-v1.properties"
        );
        assert_eq!(
            FilePropertyStore::file_name(&identity().with_classifier("blue")),
            "ciao-configuration-test-v1-blue.properties"
        );
    }

    #[test]
    fn test_version_doesnt_exist() {
        let dir = ConfigDir::new();
        let store = FilePropertyStore::new(Some(dir.path())).unwrap();
        assert!(!store.version_exists(&identity()).unwrap());
    }

    #[test]
    fn test_seed_then_load_has_no_marker() {
        let dir = ConfigDir::new();
        let store = FilePropertyStore::new(Some(dir.path())).unwrap();

        let seeded = store.set_defaults(&identity(), &test_defaults()).unwrap();
        assert!(store.version_exists(&identity()).unwrap());

        let loaded = store.load_config(&identity()).unwrap();
        let expected: BTreeSet<String> = ["testProperty1", "testProperty2"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(seeded.config_keys(), expected);
        assert_eq!(loaded.config_keys(), expected);
        assert_eq!(loaded.config_value("testProperty2"), Some("testValue2"));
    }

    #[test]
    fn test_seeded_file_contents() {
        let dir = ConfigDir::new();
        let store = FilePropertyStore::new(Some(dir.path())).unwrap();
        store.set_defaults(&identity(), &test_defaults()).unwrap();

        let contents = fs::read_to_string(dir.file("ciao-configuration-test-v1.properties")).unwrap();
        assert_eq!(
            contents,
            "# CIAO configuration for ciao-configuration-test/v1\n\
             testProperty1=testValue1\n\
             testProperty2=testValue2\n"
        );
    }

    #[test]
    fn test_classifiers_use_separate_files() {
        let dir = ConfigDir::new();
        let store = FilePropertyStore::new(Some(dir.path())).unwrap();
        store.set_defaults(&identity(), &test_defaults()).unwrap();
        assert!(!store
            .version_exists(&identity().with_classifier("blue"))
            .unwrap());
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = ConfigDir::new();
        let nested = dir.file("nested/config");
        let store = FilePropertyStore::new(Some(nested.as_path())).unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.path(), nested.as_path());
    }

    #[test]
    fn test_path_that_is_a_file_is_unavailable() {
        let dir = ConfigDir::new();
        let file = dir.file("plain-file");
        fs::write(&file, "x").unwrap();
        let err = FilePropertyStore::new(Some(file.as_path())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    }

    #[test]
    fn test_directory_in_place_of_file_is_unavailable() {
        let dir = ConfigDir::new();
        fs::create_dir(dir.file("ciao-configuration-test-v1.properties")).unwrap();
        let store = FilePropertyStore::new(Some(dir.path())).unwrap();
        let err = store.version_exists(&identity()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let dir = ConfigDir::new();
        let store = FilePropertyStore::new(Some(dir.path())).unwrap();
        let err = store.load_config(&identity()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_load_hand_edited_file() {
        let dir = ConfigDir::new();
        fs::write(
            dir.file("ciao-configuration-test-v1.properties"),
            "# edited by ops\nport : 8080\nhost=cip.local\n",
        )
        .unwrap();
        let store = FilePropertyStore::new(Some(dir.path())).unwrap();
        let loaded = store.load_config(&identity()).unwrap();
        assert_eq!(loaded.config_value("port"), Some("8080"));
        assert_eq!(loaded.config_value("host"), Some("cip.local"));
        assert!(!loaded.contains_key("configured"));
    }

    #[test]
    fn test_malformed_file_is_unavailable() {
        let dir = ConfigDir::new();
        fs::write(dir.file("ciao-configuration-test-v1.properties"), "bad=\\uZZZZ\n").unwrap();
        let store = FilePropertyStore::new(Some(dir.path())).unwrap();
        let err = store.load_config(&identity()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    }

    #[test]
    fn test_empty_defaults_are_invalid() {
        let dir = ConfigDir::new();
        let store = FilePropertyStore::new(Some(dir.path())).unwrap();
        let err = store
            .set_defaults(&identity(), &BTreeMap::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDefaults);
        assert!(!store.version_exists(&identity()).unwrap());
    }

    #[test]
    fn test_seed_leaves_no_temporary_files() {
        let dir = ConfigDir::new();
        let store = FilePropertyStore::new(Some(dir.path())).unwrap();
        store.set_defaults(&identity(), &test_defaults()).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["ciao-configuration-test-v1.properties".to_string()]);
    }
}
