//! Shared test fixtures for the CIAO configuration workspace.
//!
//! Provides:
//! - An in-memory [`KeyValueClient`](cip_core::KeyValueClient) with etcd v2
//!   directory semantics, so network-store tests run without an etcd server
//! - Temporary configuration directories for the file backend
//! - Unique identities so tests never share a configuration set

mod fixtures;

pub use fixtures::*;
use cip_core::CipIdentity;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

pub const TEST_CIP_NAME: &str = "ciao-configuration-test";
pub const TEST_VERSION: &str = "v1";

pub fn unique_id(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}", prefix, id)
}

/// A fresh identity that no other test in this process uses.
pub fn unique_identity() -> CipIdentity {
    CipIdentity::new(unique_id(TEST_CIP_NAME), TEST_VERSION)
}

/// The defaults used across the bootstrap scenarios.
pub fn test_defaults() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("testProperty1".to_string(), "testValue1".to_string()),
        ("testProperty2".to_string(), "testValue2".to_string()),
    ])
}
