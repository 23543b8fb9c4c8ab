use errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

/// Identity of one versioned configuration set.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Addresses a configuration set in every backend. The classifier lets
/// several running instances of the same CIP and version hold independent
/// configuration (e.g. one per tenant).
///
/// ## Usage
/// ```rust
/// use cip_core::CipIdentity;
///
/// let identity = CipIdentity::new("ciao-docs-parser", "v1").with_classifier("tenant-a");
/// assert_eq!(identity.segments(), vec!["ciao-docs-parser", "v1", "tenant-a"]);
/// ```
///
/// ## Validation
/// Every segment is used verbatim as an etcd path component and as part of
/// a file name, so segments must be non-empty and free of path separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
pub struct CipIdentity {
    #[validate(length(min = 1, max = 255), custom(function = "validate_segment"))]
    name: String,

    #[validate(length(min = 1, max = 255), custom(function = "validate_segment"))]
    version: String,

    #[validate(length(min = 1, max = 255), custom(function = "validate_segment"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    classifier: Option<String>
}

impl CipIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            classifier: None,
        }
    }

    /// Sets the classifier. An empty classifier is treated as no classifier.
    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        let classifier = classifier.into();
        self.classifier = if classifier.is_empty() {
            None
        } else {
            Some(classifier)
        };
        self
    }

    pub fn with_optional_classifier(self, classifier: Option<String>) -> Self {
        match classifier {
            Some(c) => self.with_classifier(c),
            None => self,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    /// Name, version and (when present) classifier, in addressing order.
    pub fn segments(&self) -> Vec<&str> {
        let mut segments = vec![self.name.as_str(), self.version.as_str()];
        if let Some(classifier) = &self.classifier {
            segments.push(classifier);
        }
        segments
    }

    /// Validates the identity, folding validator output into the
    /// configuration error taxonomy.
    pub fn check(&self) -> Result<(), ConfigurationError> {
        self.validate()
            .map_err(|e| ConfigurationError::InvalidIdentity {
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for CipIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments().join("/"))
    }
}

fn validate_segment(value: &str) -> Result<(), ValidationError> {
    if value == "." || value == ".." {
        return Err(ValidationError::new("Segment must not be a relative path"));
    }
    if value.contains(['/', '\\']) {
        return Err(ValidationError::new("Segment must not contain a path separator"));
    }
    if value.chars().any(char::is_control) {
        return Err(ValidationError::new("Segment must not contain control characters"));
    }
    Ok(())
}

/// A single configuration key/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String
}

impl ConfigEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl From<(String, String)> for ConfigEntry {
    fn from((key, value): (String, String)) -> Self {
        Self { key, value }
    }
}
