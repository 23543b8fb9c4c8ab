//! In-memory view over one resolved configuration set.

use crate::types::{CipIdentity, ConfigEntry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A versioned set of properties for one CIP.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Returned by every [`PropertyStore`](crate::PropertyStore) backend. The
/// store decides how and where properties live; `CipProperties` only gives
/// access to one loaded set.
///
/// ## Mutability
/// Entries may be added or removed after load. Changes are never written
/// back to the backend that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipProperties {
    identity: CipIdentity,
    values: BTreeMap<String, String>
}

impl CipProperties {
    pub fn new<I, K, V>(identity: CipIdentity, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            identity,
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn from_entries(identity: CipIdentity, entries: Vec<ConfigEntry>) -> Self {
        Self::new(identity, entries.into_iter().map(|e| (e.key, e.value)))
    }

    pub fn identity(&self) -> &CipIdentity {
        &self.identity
    }

    pub fn cip_name(&self) -> &str {
        self.identity.name()
    }

    pub fn version(&self) -> &str {
        self.identity.version()
    }

    pub fn classifier(&self) -> Option<&str> {
        self.identity.classifier()
    }

    /// Value for `key`, or `None` when the key is not configured.
    pub fn config_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn config_keys(&self) -> BTreeSet<String> {
        self.values.keys().cloned().collect()
    }

    pub fn all_properties(&self) -> BTreeMap<String, String> {
        self.values.clone()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Adds or replaces a value. Returns the previous value, if any.
    pub fn add_config_value(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove_key(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }
}

impl fmt::Display for CipProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CIP: {}", self.cip_name())?;
        writeln!(f, "Version: {}", self.version())?;
        if let Some(classifier) = self.classifier() {
            writeln!(f, "Classifier: {}", classifier)?;
        }
        for (key, value) in &self.values {
            writeln!(f, "  {} = {}", key, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CipProperties {
        CipProperties::new(
            CipIdentity::new("ciao-configuration-test", "v1"),
            [("testProperty1", "testValue1"), ("testProperty2", "testValue2")],
        )
    }

    #[test]
    fn test_identity_accessors() {
        let props = sample();
        assert_eq!(props.cip_name(), "ciao-configuration-test");
        assert_eq!(props.version(), "v1");
        assert_eq!(props.classifier(), None);
    }

    #[test]
    fn test_config_value() {
        let props = sample();
        assert_eq!(props.config_value("testProperty1"), Some("testValue1"));
        assert_eq!(props.config_value("missingKey"), None);
        assert!(props.contains_key("testProperty2"));
        assert!(!props.contains_key("missingKey"));
    }

    #[test]
    fn test_config_keys() {
        let keys = sample().config_keys();
        let expected: BTreeSet<String> = ["testProperty1", "testProperty2"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_add_and_remove() {
        let mut props = sample();
        assert_eq!(props.add_config_value("extra", "1"), None);
        assert_eq!(props.add_config_value("extra", "2"), Some("1".to_string()));
        assert_eq!(props.config_value("extra"), Some("2"));
        assert_eq!(props.len(), 3);

        assert_eq!(props.remove_key("extra"), Some("2".to_string()));
        assert_eq!(props.remove_key("extra"), None);
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn test_all_properties_is_a_copy() {
        let props = sample();
        let mut all = props.all_properties();
        all.insert("local".to_string(), "only".to_string());
        assert!(!props.contains_key("local"));
    }

    #[test]
    fn test_from_entries() {
        let props = CipProperties::from_entries(
            CipIdentity::new("app", "v1"),
            vec![ConfigEntry::new("a", "1"), ConfigEntry::new("b", "2")],
        );
        assert_eq!(props.entries().collect::<Vec<_>>(), vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn test_display_lists_entries() {
        let rendered = CipProperties::new(
            CipIdentity::new("app", "v1").with_classifier("blue"),
            [("k", "v")],
        )
        .to_string();
        assert!(rendered.contains("CIP: app"));
        assert!(rendered.contains("Version: v1"));
        assert!(rendered.contains("Classifier: blue"));
        assert!(rendered.contains("k = v"));
    }
}
