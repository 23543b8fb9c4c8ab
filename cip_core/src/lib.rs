//! # CIAO Configuration Core
//!
//! Shared types and traits for CIAO configuration.
//!
//! This crate provides:
//! - [`CipIdentity`]: the `(name, version, classifier)` tuple addressing one
//!   configuration set
//! - [`CipProperties`]: the in-memory view over one resolved configuration set
//! - [`PropertyStore`]: the capability implemented by every storage backend
//! - [`KeyValueClient`]: the narrow seam to a hierarchical key-value service

pub mod properties;
pub mod traits;
pub mod types;

pub use properties::CipProperties;
pub use traits::{KeyValueClient, PropertyStore};
pub use types::{CipIdentity, ConfigEntry};
