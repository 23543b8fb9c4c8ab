//! # Defaults File Loading
//!
//! Loads a CIP's default configuration values from TOML, YAML or
//! `.properties` files.
//!
//! Supports automatic format detection based on file extension. Nested
//! tables are flattened into dotted keys and scalar values are converted to
//! strings, since configuration sets are flat string maps.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

/// Defaults file loading error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read {path}: {reason}")]
    ReadError { path: String, reason: String },

    #[error("Failed to parse TOML: {0}")]
    TomlParse(String),

    #[error("Failed to parse YAML: {0}")]
    YamlParse(String),

    #[error("Failed to parse properties: {0}")]
    PropertiesParse(String),

    #[error("Unsupported value for key {key}: {reason}")]
    UnsupportedValue { key: String, reason: String },

    #[error("Config file has no extension")]
    NoExtension,

    #[error("Unsupported config file format: {0}")]
    UnsupportedFormat(String),
}

/// Load default configuration values from file with auto-detection.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Reads the values a CIP seeds into its configuration store on first run.
///
/// ## Supported Formats
/// - `.toml`: TOML format
/// - `.yaml` / `.yml`: YAML format
/// - `.properties`: line-oriented `key=value`
///
/// ## Usage
/// ```rust,no_run
/// use config::load_defaults;
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let defaults = load_defaults(Path::new("defaults.toml"))?;
///     println!("{} default values", defaults.len());
///     Ok(())
/// }
/// ```
///
/// ## Error Handling
/// Returns `ConfigFileError` for:
/// - File not found, or present but unreadable
/// - Invalid or unsupported file extension
/// - Parse errors for detected format
/// - Arrays and null values, which have no flat string form
pub fn load_defaults(path: &Path) -> Result<BTreeMap<String, String>, ConfigFileError> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or(ConfigFileError::NoExtension)?;

    match extension.to_lowercase().as_str() {
        "toml" => load_from_toml(path),
        "yaml" | "yml" => load_from_yaml(path),
        "properties" => load_from_properties(path),
        other => Err(ConfigFileError::UnsupportedFormat(other.to_string())),
    }
}

pub fn load_from_toml(path: &Path) -> Result<BTreeMap<String, String>, ConfigFileError> {
    let contents = read(path)?;
    let table: toml::Table =
        toml::from_str(&contents).map_err(|e| ConfigFileError::TomlParse(e.to_string()))?;

    let mut values = BTreeMap::new();
    for (key, value) in table {
        flatten_toml(&key, value, &mut values)?;
    }
    Ok(values)
}

pub fn load_from_yaml(path: &Path) -> Result<BTreeMap<String, String>, ConfigFileError> {
    let contents = read(path)?;
    let document: serde_yaml::Value =
        serde_yaml::from_str(&contents).map_err(|e| ConfigFileError::YamlParse(e.to_string()))?;

    let mut values = BTreeMap::new();
    match document {
        serde_yaml::Value::Mapping(mapping) => {
            for (key, value) in mapping {
                flatten_yaml(&yaml_key(&key)?, value, &mut values)?;
            }
        }
        serde_yaml::Value::Null => {}
        _ => {
            return Err(ConfigFileError::YamlParse(
                "top level must be a mapping".to_string(),
            ));
        }
    }
    Ok(values)
}

pub fn load_from_properties(path: &Path) -> Result<BTreeMap<String, String>, ConfigFileError> {
    let contents = read(path)?;
    storage::properties::parse(&contents)
        .map_err(|e| ConfigFileError::PropertiesParse(e.to_string()))
}

fn read(path: &Path) -> Result<String, ConfigFileError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ConfigFileError::FileNotFound(path.display().to_string()),
        _ => ConfigFileError::ReadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        },
    })
}

fn flatten_toml(
    key: &str,
    value: toml::Value,
    out: &mut BTreeMap<String, String>,
) -> Result<(), ConfigFileError> {
    let flat = match value {
        toml::Value::String(s) => s,
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(d) => d.to_string(),
        toml::Value::Table(table) => {
            for (child, value) in table {
                flatten_toml(&format!("{}.{}", key, child), value, out)?;
            }
            return Ok(());
        }
        toml::Value::Array(_) => return Err(unsupported(key, "arrays are not supported")),
    };
    out.insert(key.to_string(), flat);
    Ok(())
}

fn flatten_yaml(
    key: &str,
    value: serde_yaml::Value,
    out: &mut BTreeMap<String, String>,
) -> Result<(), ConfigFileError> {
    let flat = match value {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Mapping(mapping) => {
            for (child, value) in mapping {
                flatten_yaml(&format!("{}.{}", key, yaml_key(&child)?), value, out)?;
            }
            return Ok(());
        }
        serde_yaml::Value::Tagged(tagged) => return flatten_yaml(key, tagged.value, out),
        serde_yaml::Value::Sequence(_) => {
            return Err(unsupported(key, "sequences are not supported"));
        }
        serde_yaml::Value::Null => return Err(unsupported(key, "null has no value")),
    };
    out.insert(key.to_string(), flat);
    Ok(())
}

fn yaml_key(key: &serde_yaml::Value) -> Result<String, ConfigFileError> {
    match key {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(ConfigFileError::YamlParse(format!(
            "unsupported mapping key {:?}",
            other
        ))),
    }
}

fn unsupported(key: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::UnsupportedValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
